//! End-to-end buffered session against the recording backend.

use std::fmt::Write as _;
use std::sync::Mutex;

use uartdm::regs::{Command, Irq, Status, offset};
use uartdm::{RxRing, UartDm, UartDmConfig, UartDmSession};
use uartdm_core::log::{self, LogLevel};
use uartdm_driver_api::{Delay, IntPending, LineParams, Parity, UartDevice};
use uartdm_mmio::mock::MockIo;

#[derive(Clone, Copy)]
struct NoDelay;

impl Delay for NoDelay {
    fn delay_us(&self, _us: u32) {}
}

fn session(io: &MockIo) -> UartDmSession<MockIo, NoDelay> {
    let port = UartDm::with_config(io.clone(), 0, UartDmConfig::DEFAULT, NoDelay);
    UartDmSession::new(port)
}

#[test]
fn attach_transmit_and_receive() {
    let io = MockIo::new();
    let s = session(&io);

    s.initialize(&LineParams::EIGHT_N_ONE).unwrap();
    assert_eq!(io.writes_to(offset::IMR), [0]);
    UartDevice::attach(&s).unwrap();
    assert_eq!(s.interrupt_mask(), Irq::ATTACH);

    // Transmit a FIFO-sized chunk.
    io.clear_log();
    io.set(offset::SR, (Status::TXEMT | Status::TXRDY).bits());
    s.transmit(b"hello\n").unwrap();
    assert!(s.tx_busy());
    let sent: Vec<u8> = io
        .writes_to(offset::FIFO0)
        .into_iter()
        .map(|w| w.to_le_bytes()[0])
        .collect();
    assert_eq!(sent, b"hello\n");
    assert_eq!(io.writes_to(offset::NO_CHARS_FOR_TX).len(), 6);

    // Transmit completion.
    io.queue(offset::MISR, &[Irq::TX_READY.bits()]);
    assert_eq!(s.ipend(), IntPending::TX_IDLE);
    s.clear_tx_busy();
    assert!(!s.interrupt_mask().contains(Irq::TX_READY));

    // Data arrives: RX level, then drain.
    io.clear_log();
    io.queue(offset::MISR, &[Irq::RXLEV.bits()]);
    assert_eq!(s.ipend(), IntPending::RX_READY);
    assert!(!s.interrupt_mask().contains(Irq::RXLEV));

    io.set(offset::SR, Status::TXEMT.bits());
    io.queue(
        offset::SR,
        &[Status::RXRDY.bits(), Status::RXRDY.bits(), Status::RXRDY.bits()],
    );
    io.queue(offset::FIFO0, &[u32::from(b'o'), u32::from(b'k'), u32::from(b'\r')]);
    let mut ring = RxRing::<16>::new();
    s.receive(&mut ring).unwrap();

    let mut got = Vec::new();
    while let Some(b) = ring.pop() {
        got.push(b);
    }
    assert_eq!(got, b"ok\r");
    assert!(s.interrupt_mask().contains(Irq::RXLEV));
    assert_eq!(io.writes_to(offset::DMRX), [512]);

    // Line goes idle with the stale timer armed.
    io.queue(offset::MISR, &[Irq::RXSTALE.bits()]);
    assert_eq!(s.ipend(), IntPending::RX_READY);
    let cr = io.writes_to(offset::CR);
    assert_eq!(
        &cr[cr.len() - 2..],
        [
            Command::STALE_EVENT_DISABLE.bits(),
            Command::RESET_STALE_INT.bits()
        ]
    );

    // Nothing further pending.
    io.clear_log();
    assert_eq!(s.ipend(), IntPending::empty());
    assert!(io.writes().is_empty());
}

#[test]
fn rejected_params_leave_session_usable() {
    let io = MockIo::new();
    let s = session(&io);
    s.initialize(&LineParams::EIGHT_N_ONE).unwrap();
    io.clear_log();

    let odd_mark = LineParams::new(57_600, 8, 1, Parity::Mark);
    assert!(UartDevice::param(&s, &odd_mark).is_err());
    assert!(io.log().is_empty());

    UartDevice::param(&s, &LineParams::new(57_600, 7, 2, Parity::Odd)).unwrap();
    assert_eq!(io.writes(), [(offset::MR2, 0x34), (offset::CSR, 0xFF)]);
}

#[test]
fn polled_io_through_live_session() {
    let io = MockIo::new();
    let s = session(&io);
    io.set(offset::SR, (Status::TXEMT | Status::TXRDY | Status::RXRDY).bits());
    io.set(offset::FIFO0, u32::from(b'#'));

    let echoed = s.with_port(|port| {
        let c = port.receive_one();
        port.transmit_one(c);
        c
    });
    assert_eq!(echoed, b'#');
    assert_eq!(io.writes_to(offset::FIFO0), [u32::from(b'#')]);
    assert_eq!(s.tx_ready_timeouts(), 0);

    let port = s.into_port();
    assert_eq!(port.rclk(), 0);
}

static LINES: Mutex<Vec<String>> = Mutex::new(Vec::new());

fn capture(level: LogLevel, args: std::fmt::Arguments<'_>) {
    let mut line = String::new();
    let _ = write!(line, "{} {}", level.name(), args);
    LINES.lock().unwrap().push(line);
}

#[test]
fn initialization_is_logged() {
    // SAFETY: `capture` only locks a std mutex.
    unsafe { log::set_log_fn(capture) };
    log::set_max_level(LogLevel::Info);

    let io = MockIo::new();
    session(&io).initialize(&LineParams::EIGHT_N_ONE).unwrap();

    let lines = LINES.lock().unwrap();
    assert!(
        lines
            .iter()
            .any(|l| l.starts_with("INFO ") && l.contains("rclk 7372800 Hz")),
        "{lines:?}"
    );
}
