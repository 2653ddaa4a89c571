// TIM6 基础定时器
//
// TIM 的主框图里没有指出 MMS 的用法，不过在 Master/Slave timer example 图中指出 UEV（Update Event）是可以触发 TRGO 的
// TIM6 没有 SMCR 寄存器，因此也没有 Master/Slave 模式

use stm32f4xx_hal::pac;

use super::rcc_regs;
use crate::error::PeripheralError;
use crate::timer::{CounterMode, MasterTrigger, TimerConfig, TriggerTimer};

pub struct Tim6 {
    tim: pac::TIM6,
}

impl Tim6 {
    pub fn new(tim: pac::TIM6) -> Self {
        Self { tim }
    }
}

impl TriggerTimer for Tim6 {
    fn init(&mut self, config: &TimerConfig) -> Result<(), PeripheralError> {
        // 基础定时器只能向上计数
        if config.counter_mode == CounterMode::Down {
            return Err(PeripheralError::Unsupported);
        }

        rcc_regs().apb1enr.modify(|_, w| w.tim6en().enabled());

        self.tim.psc.write(|w| w.psc().bits(config.prescaler));
        self.tim.arr.write(|w| w.arr().bits(config.period));
        // 手动产生一次 Update Event，让 PSC 的值立刻生效
        self.tim.egr.write(|w| w.ug().update());
        Ok(())
    }

    fn configure_master(
        &mut self,
        trigger: MasterTrigger,
        master_slave: bool,
    ) -> Result<(), PeripheralError> {
        if master_slave {
            return Err(PeripheralError::Unsupported);
        }

        self.tim.cr2.modify(|_, w| match trigger {
            MasterTrigger::Reset => w.mms().reset(),
            MasterTrigger::Enable => w.mms().enable(),
            MasterTrigger::Update => w.mms().update(),
        });
        Ok(())
    }

    fn start(&mut self) -> Result<(), PeripheralError> {
        self.tim.cr1.modify(|_, w| w.cen().enabled());
        Ok(())
    }
}
