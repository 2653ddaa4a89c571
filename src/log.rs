// 将 rprintln! 包裹了一下
//
// 在单片机上，日志经由 RTT 发送给主机；在 Host 上跑测试时没有 RTT，因此直接展开为空，
// 不过参数依旧会被 format_args! 检查一遍，避免 Host 上出现 unused 的警告

macro_rules! wave_rprintln {
    ($s:literal) => {
        #[cfg(target_os = "none")]
        rtt_target::rprintln!(concat!("[wave] ", $s));
    };
    ($s:literal, $($arg:tt)*) => {
        #[cfg(target_os = "none")]
        rtt_target::rprintln!(concat!("[wave] ", $s), $($arg)*);
        #[cfg(not(target_os = "none"))]
        {
            let _ = format_args!($s, $($arg)*);
        }
    };
}

pub(crate) use wave_rprintln;
