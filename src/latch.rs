//! 按钮中断与主循环之间的“信箱”
//!
//! 中断处理函数和主循环运行在不同的上下文中，中断可以在主循环的任意一条指令之后插入，
//! 因此两边共享的数据必须以原子的方式读写
//!
//! 这里把“当前选中的波形”和“是否需要重新配置”两个信息塞进了同一个 AtomicU8 里：
//!
//! - bit 0：波形，0 为三角波，1 为阶梯波
//! - bit 1：待重新配置标志
//!
//! 这样中断里“切换波形 + 置位标志”就是一次原子的读-改-写操作，主循环永远不会看到只改了一半的状态
//!
//! 主循环在开始重新配置前取一个快照，配置完成后，用 compare_exchange 把快照中的标志位清掉。
//! 若在配置期间按钮又被按下，那么信箱中的值已经和快照不同了，compare_exchange 会失败，
//! 标志位保持置位，下一轮循环就会按照新的波形重新配置一次

use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use crate::waveform::WaveformMode;

const MODE_BIT: u8 = 0b01;
const PENDING_BIT: u8 = 0b10;

// 上电后默认输出三角波，并且需要先完成一次配置
const BOOT_STATE: u8 = PENDING_BIT;

const fn mode_of(state: u8) -> WaveformMode {
    if state & MODE_BIT == 0 {
        WaveformMode::Triangle
    } else {
        WaveformMode::Escalator
    }
}

/// 主循环取到的一次待处理请求
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pending {
    snapshot: u8,
}

impl Pending {
    /// 本次请求要配置的波形
    pub const fn mode(&self) -> WaveformMode {
        mode_of(self.snapshot)
    }
}

pub struct ButtonLatch {
    state: AtomicU8,
    presses: AtomicU32,
}

impl ButtonLatch {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(BOOT_STATE),
            presses: AtomicU32::new(0),
        }
    }

    /// 回到上电时的状态：三角波，且需要配置
    pub fn reset(&self) {
        self.state.store(BOOT_STATE, Ordering::Release);
    }

    /// 由按钮中断调用：切换波形，并通知主循环
    ///
    /// 在主循环处理之前多次按下按钮，标志位依旧只有一个，不会排队
    pub fn on_button_press(&self) -> u32 {
        // fetch_update 返回的是旧值，闭包总是返回 Some，因此这里不会失败
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                Some((s ^ MODE_BIT) | PENDING_BIT)
            });
        self.presses.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 不切换波形，只要求主循环按照当前的波形重新配置一次
    ///
    /// DMA under-run 之后，DAC 不会再发出 DMA 请求，需要完整地拆除再重新配置
    pub fn request_rearm(&self) {
        self.state.fetch_or(PENDING_BIT, Ordering::AcqRel);
    }

    /// 由主循环调用：若有待处理的请求，返回它的快照
    pub fn pending(&self) -> Option<Pending> {
        let snapshot = self.state.load(Ordering::Acquire);
        (snapshot & PENDING_BIT != 0).then_some(Pending { snapshot })
    }

    /// 重新配置完成后清除标志位
    ///
    /// 若配置期间又有新的按下，返回 false，标志位保持置位
    pub fn complete(&self, pending: Pending) -> bool {
        self.state
            .compare_exchange(
                pending.snapshot,
                pending.snapshot & !PENDING_BIT,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// 当前选中的波形（不论是否已经配置完成）
    pub fn selected(&self) -> WaveformMode {
        mode_of(self.state.load(Ordering::Acquire))
    }

    pub fn presses(&self) -> u32 {
        self.presses.load(Ordering::Relaxed)
    }
}

impl Default for ButtonLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn boots_pending_on_triangle() {
        let latch = ButtonLatch::new();
        let p = latch.pending().expect("boot must request a configuration");
        assert_eq!(p.mode(), WaveformMode::Triangle);
        assert!(latch.complete(p));
        assert_eq!(latch.pending(), None);
    }

    #[rstest]
    #[case(0, WaveformMode::Triangle)]
    #[case(1, WaveformMode::Escalator)]
    #[case(2, WaveformMode::Triangle)]
    #[case(7, WaveformMode::Escalator)]
    #[case(100, WaveformMode::Triangle)]
    fn mode_follows_press_parity(#[case] presses: u32, #[case] expected: WaveformMode) {
        let latch = ButtonLatch::new();
        for _ in 0..presses {
            latch.on_button_press();
        }
        assert_eq!(latch.selected(), expected);
        assert_eq!(latch.presses(), presses);
    }

    #[test]
    fn presses_before_service_collapse() {
        let latch = ButtonLatch::new();
        let boot = latch.pending().unwrap();
        assert!(latch.complete(boot));

        latch.on_button_press();
        latch.on_button_press();
        latch.on_button_press();

        let p = latch.pending().unwrap();
        assert_eq!(p.mode(), WaveformMode::Escalator);
        assert!(latch.complete(p));
        assert_eq!(latch.pending(), None);
    }

    #[test]
    fn press_during_reconfiguration_is_queued_once() {
        let latch = ButtonLatch::new();
        let boot = latch.pending().unwrap();

        // 配置进行到一半时按钮被按下
        latch.on_button_press();
        assert!(!latch.complete(boot));

        let next = latch.pending().expect("the press must not be lost");
        assert_eq!(next.mode(), WaveformMode::Escalator);
        assert!(latch.complete(next));
        assert_eq!(latch.pending(), None);
    }

    #[test]
    fn reset_returns_to_boot_state() {
        let latch = ButtonLatch::new();
        latch.on_button_press();
        let p = latch.pending().unwrap();
        latch.complete(p);

        latch.reset();
        let p = latch.pending().unwrap();
        assert_eq!(p.mode(), WaveformMode::Triangle);
    }

    #[test]
    fn rearm_keeps_the_mode() {
        let latch = ButtonLatch::new();
        latch.on_button_press();
        let p = latch.pending().unwrap();
        assert!(latch.complete(p));

        latch.request_rearm();
        let p = latch.pending().expect("re-arm must request a configuration");
        assert_eq!(p.mode(), WaveformMode::Escalator);
        assert_eq!(latch.presses(), 1);
    }
}
