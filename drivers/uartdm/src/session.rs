//! Interrupt-driven, buffered operation.
//!
//! A [`UartDmSession`] serializes every register sequence of one controller
//! behind an interrupt-masking spin lock, so interrupt dispatch and the buffer
//! layer can call in from different CPUs, and dispatch never fires on a CPU
//! that is already inside a locked sequence. The lock also owns the
//! interrupt-mask shadow.
//!
//! The transmit-busy flag is shared with the buffer layer: the session sets
//! it when a buffered transmit starts and reads it to decide whether a
//! TX-ready or TX-level event means "idle"; the buffer layer clears it once
//! it has consumed that report.

use core::sync::atomic::{AtomicBool, Ordering};

use uartdm_core::kdebug;
use uartdm_core::sync::IrqSpinLock;
use uartdm_driver_api::{
    Delay, Driver, DriverError, DriverInfo, Flush, IntPending, LineParams, ProbeInfo, RxSink,
    Signals, SpinDelay, UartDevice,
};
use uartdm_mmio::RegisterIo;

use crate::mask::InterruptMask;
use crate::port::{DESCRIPTION, UartDm};
use crate::regs::{Command, Irq};
use crate::xfer::low_byte;

struct Hw<IO, D> {
    port: UartDm<IO, D>,
    mask: InterruptMask,
}

/// Buffered session over one controller.
pub struct UartDmSession<IO, D = SpinDelay> {
    hw: IrqSpinLock<Hw<IO, D>>,
    tx_busy: AtomicBool,
}

impl<IO: RegisterIo, D: Delay> UartDmSession<IO, D> {
    /// Wraps a controller. The mask shadow starts empty, matching the
    /// controller after [`UartDm::initialize`].
    #[must_use]
    pub fn new(port: UartDm<IO, D>) -> Self {
        Self {
            hw: IrqSpinLock::named(
                "uartdm",
                Hw {
                    port,
                    mask: InterruptMask::new(),
                },
            ),
            tx_busy: AtomicBool::new(false),
        }
    }

    /// Runs [`UartDm::initialize`] under the lock and resets the mask shadow.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidArgument`] if `params` are rejected. The
    /// controller is still brought up and the shadow still reset.
    pub fn initialize(&self, params: &LineParams) -> Result<(), DriverError> {
        let mut hw = self.hw.lock();
        let result = hw.port.initialize(params);
        hw.mask = InterruptMask::new();
        result
    }

    /// Enables the TX-ready, TX-level, RX-level and RX-stale sources.
    ///
    /// Hardware flow control stays off; [`UartDm::initialize`] cleared MR1
    /// and the handshake lines are not wired.
    pub fn attach(&self) {
        let mut hw = self.hw.lock();
        let Hw { port, mask } = &mut *hw;
        mask.set(Irq::ATTACH).commit(port.regs());
        kdebug!("uartdm: attached, mask {:#x}", Irq::ATTACH.bits());
    }

    /// Transmits `bytes` one at a time, then arms TX-ready and marks the
    /// transmitter busy.
    ///
    /// The buffer layer sizes `bytes` to the FIFO depth.
    pub fn transmit_buffer(&self, bytes: &[u8]) {
        let mut hw = self.hw.lock();
        let Hw { port, mask } = &mut *hw;
        let regs = port.regs();

        for &byte in bytes {
            port.transmit_one(byte);
            regs.barrier();
        }

        mask.enable(Irq::TX_READY).commit(regs);
        regs.barrier();
        self.tx_busy.store(true, Ordering::Release);
    }

    /// Re-arms stale detection and moves received bytes into `sink` until the
    /// FIFO is empty or the sink is full.
    ///
    /// A full sink gets one overrun mark and draining stops; bytes left in the
    /// FIFO stay there for the next call.
    pub fn receive_drain<S: RxSink + ?Sized>(&self, sink: &mut S) {
        let mut hw = self.hw.lock();
        let Hw { port, mask } = &mut *hw;
        let regs = port.regs();

        regs.set_cr(Command::RESET_STALE_INT);
        regs.set_dmrx(port.config().rx_transfer_len);
        regs.set_cr(Command::STALE_EVENT_ENABLE);
        mask.enable(Irq::RXLEV).commit(regs);

        while port.receive_ready() {
            if sink.is_full() {
                kdebug!("uartdm: receive buffer full, dropping");
                sink.mark_overrun();
                break;
            }
            let byte = low_byte(regs.rf(0));
            regs.barrier();
            sink.put(byte);
        }
    }

    /// Reads the masked interrupt status once, acknowledges each pending
    /// source, and reports which classes the buffer layer should service.
    ///
    /// Sources are handled in a fixed order: RX level, RX stale, TX ready,
    /// TX level. TX events only report idle while the transmitter is busy.
    pub fn dispatch_pending(&self) -> IntPending {
        let mut hw = self.hw.lock();
        let Hw { port, mask } = &mut *hw;
        let regs = port.regs();

        let status = regs.misr();
        let mut pending = IntPending::empty();

        if status.contains(Irq::RXLEV) {
            mask.disable(Irq::RXLEV).commit(regs);
            regs.barrier();
            pending |= IntPending::RX_READY;
        }

        if status.contains(Irq::RXSTALE) {
            regs.set_cr(Command::STALE_EVENT_DISABLE);
            regs.set_cr(Command::RESET_STALE_INT);
            regs.barrier();
            pending |= IntPending::RX_READY;
        }

        if status.contains(Irq::TX_READY) {
            regs.set_cr(Command::CLEAR_TX_READY);
            mask.disable(Irq::TX_READY).commit(regs);
            regs.barrier();
            if self.tx_busy() {
                pending |= IntPending::TX_IDLE;
            }
        }

        if status.contains(Irq::TXLEV) {
            mask.disable(Irq::TXLEV).commit(regs);
            regs.barrier();
            if self.tx_busy() {
                pending |= IntPending::TX_IDLE;
            }
        }

        pending
    }

    /// Reprograms line parameters under the lock.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidArgument`] if `params` are rejected.
    pub fn param(&self, params: &LineParams) -> Result<(), DriverError> {
        let mut hw = self.hw.lock();
        hw.port.resolve_clock();
        hw.port.set_line_params(params)
    }

    /// Whether a buffered transmit is in flight.
    #[must_use]
    pub fn tx_busy(&self) -> bool {
        self.tx_busy.load(Ordering::Acquire)
    }

    /// Marks the transmitter idle after a TX_IDLE report has been handled.
    pub fn clear_tx_busy(&self) {
        self.tx_busy.store(false, Ordering::Release);
    }

    /// The interrupt sources currently enabled.
    #[must_use]
    pub fn interrupt_mask(&self) -> Irq {
        self.hw.lock().mask.enabled()
    }

    /// Transmits that went ahead after the TX-ready poll budget ran out.
    #[must_use]
    pub fn tx_ready_timeouts(&self) -> u32 {
        self.hw.lock().port.tx_ready_timeouts()
    }

    /// Runs `f` with exclusive access to the controller, for polled I/O
    /// while the session is live. Interrupts stay masked on this CPU until
    /// `f` returns.
    pub fn with_port<R>(&self, f: impl FnOnce(&UartDm<IO, D>) -> R) -> R {
        f(&self.hw.lock().port)
    }

    /// Ends the session and returns the controller.
    pub fn into_port(self) -> UartDm<IO, D> {
        self.hw.into_inner().port
    }
}

impl<IO, D> Driver for UartDmSession<IO, D> {
    fn info(&self) -> DriverInfo {
        // Identity is static; no need to take the lock.
        DriverInfo {
            name: crate::port::DRIVER_NAME,
            driver_type: uartdm_driver_api::DriverType::Serial,
            description: DESCRIPTION,
        }
    }
}

impl<IO: RegisterIo, D: Delay> UartDevice for UartDmSession<IO, D> {
    fn probe(&self) -> Result<ProbeInfo, DriverError> {
        let fifo = self.hw.lock().port.config().fifo_size;
        Ok(ProbeInfo {
            tx_fifo_size: fifo,
            rx_fifo_size: fifo,
            description: DESCRIPTION,
        })
    }

    fn attach(&self) -> Result<(), DriverError> {
        UartDmSession::attach(self);
        Ok(())
    }

    fn transmit(&self, bytes: &[u8]) -> Result<(), DriverError> {
        self.transmit_buffer(bytes);
        Ok(())
    }

    fn receive(&self, sink: &mut dyn RxSink) -> Result<(), DriverError> {
        self.receive_drain(sink);
        Ok(())
    }

    fn ipend(&self) -> IntPending {
        self.dispatch_pending()
    }

    fn param(&self, params: &LineParams) -> Result<(), DriverError> {
        UartDmSession::param(self, params)
    }

    fn flush(&self, _what: Flush) -> Result<(), DriverError> {
        Err(DriverError::Unsupported)
    }

    fn get_signals(&self) -> Result<Signals, DriverError> {
        Err(DriverError::Unsupported)
    }

    fn set_signals(&self, _signals: Signals) -> Result<(), DriverError> {
        Err(DriverError::Unsupported)
    }

    fn ioctl(&self, _request: u32, _data: usize) -> Result<(), DriverError> {
        Err(DriverError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use uartdm_mmio::mock::{Access, MockIo};

    use super::*;
    use crate::port::tests::{NoDelay, port};
    use crate::regs::{Status, offset};
    use crate::ring::RxRing;

    fn session(io: &MockIo) -> UartDmSession<MockIo, NoDelay> {
        UartDmSession::new(port(io))
    }

    fn write(offset: usize, value: u32) -> Access {
        Access::Write { offset, value }
    }

    #[test]
    fn attach_enables_four_sources() {
        let io = MockIo::new();
        let s = session(&io);
        UartDmSession::attach(&s);
        assert_eq!(io.writes(), [(offset::IMR, 0x99)]);
        assert_eq!(s.interrupt_mask(), Irq::ATTACH);
    }

    #[test]
    fn transmit_buffer_marks_busy_after_arming_tx_ready() {
        let io = MockIo::new();
        io.set(offset::SR, (Status::TXEMT | Status::TXRDY).bits());
        let s = session(&io);
        assert!(!s.tx_busy());

        s.transmit_buffer(b"ok");
        assert!(s.tx_busy());
        assert_eq!(s.interrupt_mask(), Irq::TX_READY);

        let writes: Vec<Access> = io
            .log()
            .into_iter()
            .filter(|a| !matches!(a, Access::Read { .. }))
            .collect();
        assert_eq!(
            writes,
            [
                write(offset::NO_CHARS_FOR_TX, 1),
                write(offset::FIFO0, u32::from(b'o')),
                Access::Barrier,
                write(offset::NO_CHARS_FOR_TX, 1),
                write(offset::FIFO0, u32::from(b'k')),
                Access::Barrier,
                write(offset::IMR, Irq::TX_READY.bits()),
                Access::Barrier,
            ]
        );
    }

    #[test]
    fn empty_transmit_still_arms_tx_ready() {
        let io = MockIo::new();
        let s = session(&io);
        s.transmit_buffer(&[]);
        assert!(s.tx_busy());
        assert_eq!(io.writes(), [(offset::IMR, Irq::TX_READY.bits())]);
    }

    #[test]
    fn receive_drain_arms_stale_then_drains() {
        let io = MockIo::new();
        io.queue(offset::SR, &[Status::RXRDY.bits(), Status::RXRDY.bits()]);
        io.queue(offset::FIFO0, &[u32::from(b'h'), u32::from(b'i')]);
        let s = session(&io);
        let mut ring = RxRing::<8>::new();

        s.receive_drain(&mut ring);

        assert_eq!(ring.pop(), Some(b'h'));
        assert_eq!(ring.pop(), Some(b'i'));
        assert_eq!(ring.pop(), None);
        assert!(!ring.take_overrun());
        assert_eq!(
            io.writes(),
            [
                (offset::CR, Command::RESET_STALE_INT.bits()),
                (offset::DMRX, 512),
                (offset::CR, Command::STALE_EVENT_ENABLE.bits()),
                (offset::IMR, Irq::RXLEV.bits()),
            ]
        );
        assert_eq!(io.barriers(), 2);
        assert_eq!(s.interrupt_mask(), Irq::RXLEV);
    }

    #[test]
    fn receive_drain_with_empty_fifo_only_arms() {
        let io = MockIo::new();
        let s = session(&io);
        let mut ring = RxRing::<4>::new();
        s.receive_drain(&mut ring);
        assert!(ring.is_empty());
        assert_eq!(io.reads_of(offset::FIFO0), 0);
        assert_eq!(io.writes().len(), 4);
    }

    #[test]
    fn full_sink_marks_one_overrun_and_leaves_fifo() {
        let io = MockIo::new();
        io.set(offset::SR, Status::RXRDY.bits());
        io.set(offset::FIFO0, u32::from(b'x'));
        let s = session(&io);
        // Capacity is N - 1.
        let mut ring = RxRing::<3>::new();

        s.receive_drain(&mut ring);

        assert_eq!(ring.len(), 2);
        assert!(ring.take_overrun());
        assert!(!ring.take_overrun());
        assert_eq!(io.reads_of(offset::FIFO0), 2);
    }

    #[test]
    fn dispatch_with_nothing_pending_writes_nothing() {
        let io = MockIo::new();
        let s = session(&io);
        assert_eq!(s.dispatch_pending(), IntPending::empty());
        assert_eq!(io.log(), [Access::Read { offset: offset::MISR, value: 0 }]);
    }

    #[test]
    fn rx_level_masks_itself() {
        let io = MockIo::new();
        io.set(offset::MISR, Irq::RXLEV.bits());
        let s = session(&io);
        UartDmSession::attach(&s);
        io.clear_log();

        assert_eq!(s.dispatch_pending(), IntPending::RX_READY);
        assert_eq!(
            io.writes(),
            [(offset::IMR, (Irq::ATTACH - Irq::RXLEV).bits())]
        );
        assert_eq!(io.barriers(), 1);
    }

    #[test]
    fn rx_stale_disables_and_resets_stale() {
        let io = MockIo::new();
        io.set(offset::MISR, Irq::RXSTALE.bits());
        let s = session(&io);

        assert_eq!(s.dispatch_pending(), IntPending::RX_READY);
        assert_eq!(
            io.writes(),
            [
                (offset::CR, Command::STALE_EVENT_DISABLE.bits()),
                (offset::CR, Command::RESET_STALE_INT.bits()),
            ]
        );
        assert_eq!(s.interrupt_mask(), Irq::empty());
    }

    #[test]
    fn tx_ready_while_idle_is_acknowledged_but_not_reported() {
        let io = MockIo::new();
        io.set(offset::MISR, Irq::TX_READY.bits());
        let s = session(&io);
        UartDmSession::attach(&s);
        io.clear_log();

        assert_eq!(s.dispatch_pending(), IntPending::empty());
        assert_eq!(
            io.writes(),
            [
                (offset::CR, Command::CLEAR_TX_READY.bits()),
                (offset::IMR, (Irq::ATTACH - Irq::TX_READY).bits()),
            ]
        );
    }

    #[test]
    fn tx_ready_while_busy_reports_idle() {
        let io = MockIo::new();
        let s = session(&io);
        s.transmit_buffer(&[]);
        io.set(offset::MISR, Irq::TX_READY.bits());

        assert_eq!(s.dispatch_pending(), IntPending::TX_IDLE);
        assert!(!s.interrupt_mask().contains(Irq::TX_READY));
        // The buffer layer owns the transition back to idle.
        assert!(s.tx_busy());
        s.clear_tx_busy();
        assert!(!s.tx_busy());
    }

    #[test]
    fn all_sources_handled_in_order() {
        let io = MockIo::new();
        let s = session(&io);
        UartDmSession::attach(&s);
        s.transmit_buffer(&[]);
        io.set(offset::MISR, Irq::ATTACH.bits());
        io.clear_log();

        assert_eq!(
            s.dispatch_pending(),
            IntPending::RX_READY | IntPending::TX_IDLE
        );
        assert_eq!(io.reads_of(offset::MISR), 1);
        assert_eq!(
            io.writes(),
            [
                (offset::IMR, 0x89),
                (offset::CR, Command::STALE_EVENT_DISABLE.bits()),
                (offset::CR, Command::RESET_STALE_INT.bits()),
                (offset::CR, Command::CLEAR_TX_READY.bits()),
                (offset::IMR, 0x09),
                (offset::IMR, 0x08),
            ]
        );
        assert_eq!(io.barriers(), 4);
        assert_eq!(s.interrupt_mask(), Irq::RXSTALE);
    }

    #[test]
    fn unsupported_operations() {
        let io = MockIo::new();
        let s = session(&io);
        assert_eq!(s.flush(Flush::RX | Flush::TX), Err(DriverError::Unsupported));
        assert_eq!(s.get_signals(), Err(DriverError::Unsupported));
        assert_eq!(s.set_signals(Signals::DTR), Err(DriverError::Unsupported));
        assert_eq!(s.ioctl(0, 0), Err(DriverError::Unsupported));
        assert!(io.log().is_empty());
    }

    #[test]
    fn probe_reports_fifo_geometry() {
        let io = MockIo::new();
        let info = UartDevice::probe(&session(&io)).unwrap();
        assert_eq!(info.tx_fifo_size, 64);
        assert_eq!(info.rx_fifo_size, 64);
        assert_eq!(info.description, "Qualcomm HSUART");
    }

    #[test]
    fn param_rejects_without_writing() {
        let io = MockIo::new();
        let s = session(&io);
        let bad = LineParams::new(115_200, 4, 1, uartdm_driver_api::Parity::None);
        assert_eq!(
            UartDevice::param(&s, &bad),
            Err(DriverError::InvalidArgument)
        );
        assert!(io.log().is_empty());
        UartDevice::param(&s, &LineParams::EIGHT_N_ONE).unwrap();
        assert_eq!(io.writes(), [(offset::MR2, 0x34), (offset::CSR, 0xFF)]);
    }

    #[test]
    fn rejected_initialize_still_resets_mask_shadow() {
        let io = MockIo::new();
        let s = session(&io);
        UartDmSession::attach(&s);
        let mark = LineParams::new(115_200, 8, 1, uartdm_driver_api::Parity::Mark);
        assert_eq!(s.initialize(&mark), Err(DriverError::InvalidArgument));
        assert_eq!(s.interrupt_mask(), Irq::empty());
        assert_eq!(io.writes_to(offset::CR).len(), 7);
    }

    /// One simulated CPU per test thread: interrupts raised while masked are
    /// held until the mask is lifted.
    mod cpu {
        use std::cell::{Cell, RefCell};

        use uartdm_core::sync::IrqOps;

        type Handler = Box<dyn FnOnce()>;

        thread_local! {
            static IRQS_ON: Cell<bool> = const { Cell::new(true) };
            static PENDING: RefCell<Vec<Handler>> = const { RefCell::new(Vec::new()) };
        }

        fn save() -> usize {
            usize::from(IRQS_ON.with(|on| on.replace(false)))
        }

        fn restore(flags: usize) {
            if flags != 0 {
                IRQS_ON.with(|on| on.set(true));
                for handler in PENDING.take() {
                    handler();
                }
            }
        }

        pub static OPS: IrqOps = IrqOps {
            save_and_disable: save,
            restore,
        };

        pub fn irqs_on() -> bool {
            IRQS_ON.with(Cell::get)
        }

        pub fn raise(handler: impl FnOnce() + 'static) {
            if irqs_on() {
                handler();
            } else {
                PENDING.with(|p| p.borrow_mut().push(Box::new(handler)));
            }
        }
    }

    #[test]
    fn interrupt_raised_inside_locked_section_runs_after_release() {
        // SAFETY: the simulated CPU only tracks per-thread state; threads
        // that never raise an interrupt see no difference.
        unsafe { uartdm_core::sync::set_irq_ops(&cpu::OPS) };

        let io = MockIo::new();
        io.set(offset::MISR, Irq::RXLEV.bits());
        let s = Rc::new(session(&io));
        let seen = Rc::new(RefCell::new(None));

        let (handler_s, handler_seen) = (Rc::clone(&s), Rc::clone(&seen));
        s.with_port(move |_| {
            assert!(!cpu::irqs_on());
            cpu::raise(move || {
                *handler_seen.borrow_mut() = Some(handler_s.dispatch_pending());
            });
        });

        assert!(cpu::irqs_on());
        assert_eq!(*seen.borrow(), Some(IntPending::RX_READY));
        assert_eq!(io.reads_of(offset::MISR), 1);
    }

    #[test]
    fn initialize_resets_mask_shadow() {
        let io = MockIo::new();
        let s = session(&io);
        UartDmSession::attach(&s);
        s.initialize(&LineParams::EIGHT_N_ONE).unwrap();
        assert_eq!(s.interrupt_mask(), Irq::empty());
        assert_eq!(s.with_port(UartDm::rclk), 7_372_800);
    }
}
