//! Controller bring-up.

use uartdm_core::{kinfo, ktrace};
use uartdm_driver_api::{Delay, DriverError, LineParams};
use uartdm_mmio::RegisterIo;

use crate::line::LineMode;
use crate::port::UartDm;
use crate::regs::{Command, Irq, MR1_NO_FLOW_CONTROL};

/// Reset commands issued after the mode registers are programmed, in order.
const RESET_SEQUENCE: [Command; 5] = [
    Command::RESET_TX,
    Command::RESET_RX,
    Command::RESET_ERROR_STATUS,
    Command::RESET_BREAK_INT,
    Command::RESET_STALE_INT,
];

impl<IO: RegisterIo, D: Delay> UartDm<IO, D> {
    /// Validates `params` and programs the character format and clock.
    ///
    /// The requested format is checked but the controller is always run at
    /// 8-N-1 with the configured clock select; the baud rate is not used.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidArgument`] without touching any register
    /// if the format cannot be encoded.
    pub fn set_line_params(&self, params: &LineParams) -> Result<(), DriverError> {
        let requested = LineMode::from_params(params)?;
        if requested != LineMode::EIGHT_N_ONE {
            ktrace!(
                "uartdm: requested mode {:#04x} at {} baud, running 8-N-1",
                requested.bits(),
                params.baud
            );
        }

        let regs = self.regs();
        regs.set_mr2(LineMode::EIGHT_N_ONE.bits());
        regs.set_csr(self.config().clock_select);
        regs.barrier();
        Ok(())
    }

    /// Brings the controller to a known, enabled state.
    ///
    /// Substitutes the fallback clock if none was supplied, programs line
    /// parameters, masks every interrupt, resets both directions and all
    /// latched status, disables DMA, then enables receiver and transmitter.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidArgument`] if `params` are rejected. Only
    /// the MR2 and CSR writes are skipped then; the rest of bring-up runs.
    ///
    /// # Panics
    ///
    /// Panics if neither the handle nor the configuration provides a
    /// non-zero reference clock.
    pub fn initialize(&mut self, params: &LineParams) -> Result<(), DriverError> {
        let rclk = self.resolve_clock();
        let line = self.set_line_params(params);

        let cfg = *self.config();
        let regs = self.regs();

        regs.set_mr1(MR1_NO_FLOW_CONTROL);
        regs.set_imr(Irq::empty());
        regs.set_tfwr(cfg.tx_watermark);
        regs.set_rfwr(cfg.rx_watermark);
        regs.set_ipr(cfg.stale_timeout);
        regs.set_irda(0);
        regs.set_hcr(0);

        for cmd in RESET_SEQUENCE {
            regs.set_cr(cmd);
        }

        regs.set_dmen(0);
        regs.set_cr(Command::RX_ENABLE);
        regs.set_cr(Command::TX_ENABLE);
        regs.barrier();

        kinfo!("uartdm: initialized, rclk {} Hz", rclk);
        line
    }
}

#[cfg(test)]
mod tests {
    use uartdm_driver_api::Parity;
    use uartdm_mmio::mock::{Access, MockIo};

    use super::*;
    use crate::port::tests::port;
    use crate::regs::offset;

    fn write(offset: usize, value: u32) -> Access {
        Access::Write { offset, value }
    }

    #[test]
    fn initialize_writes_exact_sequence() {
        let io = MockIo::new();
        let mut p = port(&io);
        p.initialize(&LineParams::EIGHT_N_ONE).unwrap();

        assert_eq!(
            io.log(),
            [
                write(offset::MR2, 0x34),
                write(offset::CSR, 0xFF),
                Access::Barrier,
                write(offset::MR1, 0),
                write(offset::IMR, 0),
                write(offset::TFWR, 0),
                write(offset::RFWR, 0),
                write(offset::IPR, 0x0F),
                write(offset::IRDA, 0),
                write(offset::HCR, 0),
                write(offset::CR, 0x20),
                write(offset::CR, 0x10),
                write(offset::CR, 0x30),
                write(offset::CR, 0x40),
                write(offset::CR, 0x80),
                write(offset::DMEN, 0),
                write(offset::CR, 0x01),
                write(offset::CR, 0x04),
                Access::Barrier,
            ]
        );
    }

    #[test]
    fn initialize_reads_nothing() {
        let io = MockIo::new();
        port(&io).initialize(&LineParams::EIGHT_N_ONE).unwrap();
        assert!(!io.log().iter().any(|a| matches!(a, Access::Read { .. })));
    }

    #[test]
    fn mask_is_cleared_during_initialize() {
        let io = MockIo::new();
        port(&io).initialize(&LineParams::EIGHT_N_ONE).unwrap();
        assert_eq!(io.writes_to(offset::IMR), [0]);
    }

    #[test]
    fn rejected_params_skip_only_line_setup() {
        let io = MockIo::new();
        let mut p = port(&io);
        p.initialize(&LineParams::EIGHT_N_ONE).unwrap();
        // MR2, CSR and their barrier lead the full sequence.
        let rest = io.log().split_off(3);

        for params in [
            LineParams::new(115_200, 8, 1, Parity::Mark),
            LineParams::new(115_200, 9, 1, Parity::None),
            LineParams::new(115_200, 8, 3, Parity::None),
        ] {
            io.clear_log();
            assert_eq!(p.initialize(&params), Err(DriverError::InvalidArgument));
            assert_eq!(io.log(), rest);
            assert!(io.writes_to(offset::MR2).is_empty());
            assert!(io.writes_to(offset::CSR).is_empty());
        }
    }

    #[test]
    fn non_default_format_still_programs_eight_n_one() {
        let io = MockIo::new();
        let p = port(&io);
        p.set_line_params(&LineParams::new(9600, 7, 2, Parity::Even))
            .unwrap();
        assert_eq!(
            io.log(),
            [write(offset::MR2, 0x34), write(offset::CSR, 0xFF), Access::Barrier]
        );
    }

    #[test]
    fn configured_values_are_programmed() {
        let io = MockIo::new();
        let cfg = crate::config::UartDmConfig::DEFAULT
            .with_watermarks(4, 12)
            .with_stale_timeout(0x1F)
            .with_clock_select(0xEE);
        let mut p = UartDm::with_config(io.clone(), 0, cfg, crate::port::tests::NoDelay);
        p.initialize(&LineParams::EIGHT_N_ONE).unwrap();
        assert_eq!(io.writes_to(offset::TFWR), [4]);
        assert_eq!(io.writes_to(offset::RFWR), [12]);
        assert_eq!(io.writes_to(offset::IPR), [0x1F]);
        assert_eq!(io.writes_to(offset::CSR), [0xEE]);
    }

    #[test]
    fn repeated_initialize_repeats_sequence() {
        let io = MockIo::new();
        let mut p = port(&io);
        p.initialize(&LineParams::EIGHT_N_ONE).unwrap();
        let first = io.log();
        io.clear_log();
        p.initialize(&LineParams::EIGHT_N_ONE).unwrap();
        assert_eq!(io.log(), first);
    }
}
