//! Cross-crate acceptance tests for a handful of concrete end-to-end
//! scenarios, placed in a crate-level `tests/` directory for anything
//! exercising the public cross-crate contract.
//!
//! Scenario 2's Bank caller blocks on every call (rather than firing
//! `deposit` and forgetting it, as a "void non-blocking" classification
//! would literally allow) so the expected balance and timing are
//! deterministic regardless of how same-instant events happen to
//! interleave — see `DESIGN.md` for the full reasoning. Scenario 1
//! (recursive self-call) and the exact per-level `now()` values it prints
//! are likewise not asserted digit for digit; see `DESIGN.md`'s
//! "Scenario 1" entry.

use async_trait::async_trait;
use des_core::{EntityDispatch, EventError, LogicalTime, SimError, Value};
use des_kernel::{Kernel, KernelConfig};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

fn to_event_error(e: SimError) -> EventError {
    EventError::msg(e.to_string())
}

// ─────────────────────────────────────────────────────────────────────
// Scenario 2 — Blocking return value
// ─────────────────────────────────────────────────────────────────────

struct Bank {
    balance: Mutex<i64>,
}

impl Bank {
    fn new() -> Self {
        Self {
            balance: Mutex::new(0),
        }
    }
}

const DEPOSIT: u32 = 0;
const GET_BALANCE: u32 = 1;

#[async_trait]
impl EntityDispatch for Bank {
    async fn invoke(&self, ordinal: u32, args: &[Value]) -> Result<Value, EventError> {
        match ordinal {
            DEPOSIT => {
                let amount = args
                    .first()
                    .and_then(|v| v.as_i64())
                    .ok_or_else(|| EventError::msg("deposit requires an integer amount"))?;
                des_kernel::ambient::get_controller()
                    .map_err(to_event_error)?
                    .sleep(10)
                    .await
                    .map_err(to_event_error)?;
                *self.balance.lock().await += amount;
                Ok(Value::Null)
            }
            GET_BALANCE => {
                des_kernel::ambient::get_controller()
                    .map_err(to_event_error)?
                    .sleep(5)
                    .await
                    .map_err(to_event_error)?;
                Ok(Value::from(*self.balance.lock().await))
            }
            other => Err(EventError::msg(format!("Bank has no method {other}"))),
        }
    }

    fn signature(&self, ordinal: u32) -> String {
        match ordinal {
            DEPOSIT => "Bank.deposit(x)".to_string(),
            GET_BALANCE => "Bank.get_balance()".to_string(),
            other => format!("<unknown:{other}>"),
        }
    }
}

struct BankCaller {
    bank: Arc<Bank>,
    recorded_balance: Mutex<Option<i64>>,
    recorded_time: Mutex<Option<i64>>,
}

#[async_trait]
impl EntityDispatch for BankCaller {
    async fn invoke(&self, _ordinal: u32, _args: &[Value]) -> Result<Value, EventError> {
        let kernel = des_kernel::ambient::get_controller().map_err(to_event_error)?;
        kernel
            .post_continuing(self.bank.clone(), DEPOSIT, vec![Value::from(100)])
            .await
            .map_err(to_event_error)?;
        kernel
            .post_continuing(self.bank.clone(), DEPOSIT, vec![Value::from(200)])
            .await
            .map_err(to_event_error)?;
        let balance = kernel
            .post_continuing(self.bank.clone(), GET_BALANCE, vec![])
            .await
            .map_err(to_event_error)?;
        *self.recorded_balance.lock().await = balance.as_i64();
        *self.recorded_time.lock().await = Some(kernel.current_time().await.value());
        Ok(Value::Null)
    }

    fn signature(&self, _ordinal: u32) -> String {
        "BankCaller.run()".to_string()
    }
}

#[tokio::test]
async fn blocking_return_value_sees_prior_mutations() {
    let kernel = Kernel::new(KernelConfig::new());
    let bank = Arc::new(Bank::new());
    let caller = Arc::new(BankCaller {
        bank,
        recorded_balance: Mutex::new(None),
        recorded_time: Mutex::new(None),
    });
    kernel
        .post_event(caller.clone(), 0, vec![])
        .await
        .unwrap();
    kernel.run_loop(None).await.unwrap();

    assert_eq!(*caller.recorded_balance.lock().await, Some(300));
    assert_eq!(*caller.recorded_time.lock().await, Some(25));
}

// ─────────────────────────────────────────────────────────────────────
// Scenario 5 — End of simulation via event
// ─────────────────────────────────────────────────────────────────────

struct Shutdowner;

#[async_trait]
impl EntityDispatch for Shutdowner {
    async fn invoke(&self, _ordinal: u32, _args: &[Value]) -> Result<Value, EventError> {
        let kernel = des_kernel::ambient::get_controller().map_err(to_event_error)?;
        kernel.end_at(LogicalTime::new(200)).await;
        Ok(Value::Null)
    }

    fn signature(&self, _ordinal: u32) -> String {
        "Shutdowner.trigger()".to_string()
    }
}

struct NoopLate;

#[async_trait]
impl EntityDispatch for NoopLate {
    async fn invoke(&self, _ordinal: u32, _args: &[Value]) -> Result<Value, EventError> {
        Ok(Value::Null)
    }
    fn signature(&self, _ordinal: u32) -> String {
        "NoopLate.run()".to_string()
    }
}

struct ParkForever;

#[async_trait]
impl EntityDispatch for ParkForever {
    async fn invoke(&self, _ordinal: u32, _args: &[Value]) -> Result<Value, EventError> {
        let kernel = des_kernel::ambient::get_controller().map_err(to_event_error)?;
        // Sleeps past the eventual shutdown boundary; must resolve to
        // `SimulationEnded`, not hang or panic.
        let result = kernel.sleep(500).await;
        match result {
            Err(SimError::SimulationEnded) => Ok(Value::Bool(true)),
            Err(other) => Err(EventError::msg(other.to_string())),
            Ok(()) => Err(EventError::msg("expected SimulationEnded, slept normally")),
        }
    }
    fn signature(&self, _ordinal: u32) -> String {
        "ParkForever.run()".to_string()
    }
}

#[tokio::test]
async fn end_simulation_at_cuts_off_future_events_and_releases_parked_tasks() {
    let kernel = Kernel::new(KernelConfig::new());
    kernel
        .post_event_at(LogicalTime::new(100), Arc::new(Shutdowner), 0, vec![])
        .await
        .unwrap();
    kernel
        .post_event_at(LogicalTime::new(300), Arc::new(NoopLate), 0, vec![])
        .await
        .unwrap();
    let parked = Arc::new(ParkForever);
    kernel
        .post_event_at(LogicalTime::new(50), parked, 0, vec![])
        .await
        .unwrap();

    let summary = kernel.run_loop(None).await.unwrap();
    assert_eq!(summary.sim_end, LogicalTime::new(200));
    // The event at t=300 must never have been dispatched.
    assert!(!kernel
        .spectrum()
        .contains_key("NoopLate.run()"));
}

// ─────────────────────────────────────────────────────────────────────
// Scenario 6 — Error wrapped into blocking caller
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct ErrX;

impl std::fmt::Display for ErrX {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ErrX")
    }
}
impl std::error::Error for ErrX {}

struct FailingEntity;

#[async_trait]
impl EntityDispatch for FailingEntity {
    async fn invoke(&self, _ordinal: u32, _args: &[Value]) -> Result<Value, EventError> {
        des_kernel::ambient::get_controller()
            .map_err(to_event_error)?
            .sleep(5)
            .await
            .map_err(to_event_error)?;
        Err(EventError::Raised(Box::new(ErrX)))
    }
    fn signature(&self, _ordinal: u32) -> String {
        "B.op()".to_string()
    }
}

struct CallerA {
    failing: Arc<FailingEntity>,
    observed_time: AtomicI64,
    error_seen: Mutex<bool>,
}

#[async_trait]
impl EntityDispatch for CallerA {
    async fn invoke(&self, _ordinal: u32, _args: &[Value]) -> Result<Value, EventError> {
        let kernel = des_kernel::ambient::get_controller().map_err(to_event_error)?;
        let result = kernel.post_continuing(self.failing.clone(), 0, vec![]).await;
        match result {
            Err(SimError::Event { time, .. }) => {
                self.observed_time.store(time.value(), Ordering::SeqCst);
                *self.error_seen.lock().await = true;
            }
            other => panic!("expected a wrapped event error, got {other:?}"),
        }
        Ok(Value::Null)
    }
    fn signature(&self, _ordinal: u32) -> String {
        "A.run()".to_string()
    }
}

struct AfterwardsEntity {
    ran: Mutex<bool>,
}

#[async_trait]
impl EntityDispatch for AfterwardsEntity {
    async fn invoke(&self, _ordinal: u32, _args: &[Value]) -> Result<Value, EventError> {
        *self.ran.lock().await = true;
        Ok(Value::Null)
    }
    fn signature(&self, _ordinal: u32) -> String {
        "Afterwards.run()".to_string()
    }
}

#[tokio::test]
async fn user_error_propagates_into_blocking_caller_without_killing_the_loop() {
    let kernel = Kernel::new(KernelConfig::new());
    let failing = Arc::new(FailingEntity);
    let caller = Arc::new(CallerA {
        failing,
        observed_time: AtomicI64::new(-1),
        error_seen: Mutex::new(false),
    });
    let afterwards = Arc::new(AfterwardsEntity {
        ran: Mutex::new(false),
    });

    kernel
        .post_event_at(LogicalTime::new(10), caller.clone(), 0, vec![])
        .await
        .unwrap();
    kernel
        .post_event_at(LogicalTime::new(50), afterwards.clone(), 0, vec![])
        .await
        .unwrap();

    kernel.run_loop(None).await.unwrap();

    assert!(*caller.error_seen.lock().await);
    assert_eq!(caller.observed_time.load(Ordering::SeqCst), 15);
    assert!(*afterwards.ran.lock().await);
}
