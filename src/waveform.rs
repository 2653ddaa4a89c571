//! 波形相关的常量与类型
//!
//! 三角波的参数都落在 DAC_CR 寄存器里：WAVE1 选择波形发生器，MAMP1 选择幅度，
//! 而阶梯波的采样点则存放在 Flash 中，由 DMA 以 8 bit 右对齐的格式写入 DHR8R1

/// 当前输出的波形
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveformMode {
    Triangle,
    Escalator,
}

impl WaveformMode {
    /// 按钮按下一次后应该切换到的波形
    pub const fn toggled(self) -> Self {
        match self {
            WaveformMode::Triangle => WaveformMode::Escalator,
            WaveformMode::Escalator => WaveformMode::Triangle,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            WaveformMode::Triangle => "Triangle",
            WaveformMode::Escalator => "Escalator",
        }
    }
}

/// 阶梯波一个周期的 6 个采样点，8 bit 右对齐
///
/// 这里用 static 而不是 const，是为了让这组数据在 Flash 中有一个固定的地址，DMA 要直接从这个地址读取数据
pub static ESCALATOR_8BIT: [u8; 6] = [0x00, 0x33, 0x66, 0x99, 0xCC, 0xFF];

/// 三角波的起始值（12 bit 右对齐）
///
/// 三角波发生器的输出是 DHR 的值加上内部的三角计数器，因此这个值也是三角波的“谷底”
pub const TRIANGLE_INITIAL_VALUE: u16 = 0x100;

/// DAC 三角波发生器的幅度，对应 DAC_CR 的 MAMP 字段
///
/// 幅度只能是 2^n - 1 的形式，MAMP 的取值 n - 1 决定了三角计数器能数到的最大值
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriangleAmplitude {
    A1,
    A3,
    A7,
    A15,
    A31,
    A63,
    A127,
    A255,
    A511,
    A1023,
    A2047,
    A4095,
}

impl TriangleAmplitude {
    /// 写入 MAMP 字段的值
    pub const fn mamp_bits(self) -> u8 {
        self as u8
    }

    /// 三角计数器的最大值
    pub const fn peak(self) -> u16 {
        (1u16 << (self.mamp_bits() + 1)) - 1
    }
}

/// DAC 数据保持寄存器的格式
///
/// 不同的格式对应不同的 DHR 寄存器：DHR8R1、DHR12R1、DHR12L1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Right8,
    Right12,
    Left12,
}

impl Alignment {
    /// 该格式下能写入的最大值
    pub const fn max_code(self) -> u16 {
        match self {
            Alignment::Right8 => 0xFF,
            Alignment::Right12 => 0x0FFF,
            // 左对齐时数据占据 [15:4]，低 4 位必须为 0
            Alignment::Left12 => 0xFFF0,
        }
    }

    pub const fn accepts(self, value: u16) -> bool {
        match self {
            Alignment::Left12 => value & 0x000F == 0,
            _ => value <= self.max_code(),
        }
    }

    /// 换算到 DOR（12 bit）中的实际输出值
    pub const fn to_output(self, value: u16) -> u16 {
        match self {
            Alignment::Right8 => (value & 0xFF) << 4,
            Alignment::Right12 => value & 0x0FFF,
            Alignment::Left12 => value >> 4,
        }
    }
}
