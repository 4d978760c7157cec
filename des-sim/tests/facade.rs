//! End-to-end exercise of the `des_sim::prelude` ambient API against a
//! real kernel, plus scenario 1.
//!
//! Scenario 1's blocking recursive `tick()` bottoms out on an explicit
//! depth counter rather than on `end_simulation`/shutdown timing: working
//! through the exact interleaving that would make every unwind step's
//! `current_time()` print a distinct, decreasing value turns out to
//! depend on assumptions about resume cost that this kernel's admission
//! gate does not share with the system the scenario was informally
//! written against (see `DESIGN.md`'s "Scenario 1" entry for the full
//! reasoning). What *is* unambiguous, and is what this test asserts, is
//! the blocking-recursion invariant the scenario is actually about: each
//! level dispatches strictly after its parent, and the outermost call's
//! continuation does not resolve until every nested call has.

use async_trait::async_trait;
use des_core::{EntityDispatch, EventError, Value};
use des_sim::prelude;
use des_testkit::{test_kernel, EchoEntity};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;

struct Ticker {
    self_ref: Weak<Ticker>,
    max_depth: u32,
    dispatch_times: Mutex<Vec<(u32, i64)>>,
    unwind_order: Mutex<Vec<u32>>,
}

impl Ticker {
    fn new(max_depth: u32) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Ticker {
            self_ref: self_ref.clone(),
            max_depth,
            dispatch_times: Mutex::new(Vec::new()),
            unwind_order: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl EntityDispatch for Ticker {
    async fn invoke(&self, _ordinal: u32, args: &[Value]) -> Result<Value, EventError> {
        let depth = args
            .first()
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;
        let kernel = prelude::get_controller().map_err(|e| EventError::msg(e.to_string()))?;

        prelude::sleep(1).await.map_err(|e| EventError::msg(e.to_string()))?;
        self.dispatch_times
            .lock()
            .await
            .push((depth, kernel.current_time().await.value()));

        if depth < self.max_depth {
            let myself = self.self_ref.upgrade().expect("ticker outlives its own events");
            kernel
                .post_continuing(myself, 0, vec![Value::from(depth + 1)])
                .await
                .map_err(|e| EventError::msg(e.to_string()))?;
        }

        self.unwind_order.lock().await.push(depth);
        Ok(Value::Null)
    }

    fn signature(&self, _ordinal: u32) -> String {
        "Ticker.tick(depth)".to_string()
    }
}

#[tokio::test]
async fn recursive_blocking_self_calls_unwind_in_reverse_dispatch_order() {
    let kernel = test_kernel();
    prelude::set_controller(Arc::clone(&kernel)).await;

    let ticker = Ticker::new(4);

    struct Entry {
        ticker: Arc<Ticker>,
    }
    #[async_trait]
    impl EntityDispatch for Entry {
        async fn invoke(&self, _ordinal: u32, _args: &[Value]) -> Result<Value, EventError> {
            let kernel = prelude::get_controller().map_err(|e| EventError::msg(e.to_string()))?;
            kernel
                .post_continuing(self.ticker.clone(), 0, vec![Value::from(0u64)])
                .await
                .map_err(|e| EventError::msg(e.to_string()))?;
            Ok(Value::Null)
        }
        fn signature(&self, _ordinal: u32) -> String {
            "Entry.run()".to_string()
        }
    }

    kernel
        .post_event(Arc::new(Entry { ticker: ticker.clone() }), 0, vec![])
        .await
        .unwrap();
    kernel.run_loop(None).await.unwrap();

    let dispatches = ticker.dispatch_times.lock().await;
    assert_eq!(
        dispatches.iter().map(|(d, _)| *d).collect::<Vec<_>>(),
        vec![0, 1, 2, 3, 4]
    );
    assert_eq!(
        dispatches.iter().map(|(_, t)| *t).collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 5]
    );

    let unwind = ticker.unwind_order.lock().await;
    assert_eq!(*unwind, vec![4, 3, 2, 1, 0]);
}

#[tokio::test]
async fn prelude_sleep_and_current_time_round_trip_through_ambient_kernel() {
    let kernel = test_kernel();

    struct Runner {
        observed: Mutex<Option<i64>>,
    }
    #[async_trait]
    impl EntityDispatch for Runner {
        async fn invoke(&self, _ordinal: u32, _args: &[Value]) -> Result<Value, EventError> {
            prelude::sleep(7).await.map_err(|e| EventError::msg(e.to_string()))?;
            let now = prelude::current_time()
                .await
                .map_err(|e| EventError::msg(e.to_string()))?;
            *self.observed.lock().await = Some(now.value());
            Ok(Value::Null)
        }
        fn signature(&self, _ordinal: u32) -> String {
            "Runner.run()".to_string()
        }
    }

    let runner = Arc::new(Runner {
        observed: Mutex::new(None),
    });
    kernel.post_event(runner.clone(), 0, vec![]).await.unwrap();
    kernel.run_loop(None).await.unwrap();
    assert_eq!(*runner.observed.lock().await, Some(7));
}

#[tokio::test]
async fn run_static_schedules_a_free_function_as_an_event() {
    let kernel = test_kernel();
    prelude::set_controller(Arc::clone(&kernel)).await;

    let calls = Arc::new(AtomicU64::new(0));
    let calls_clone = calls.clone();
    let site = des_sim::StaticSite::new("bump", move |_args| {
        let calls = calls_clone.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        }
    });

    struct Entry {
        site: Mutex<Option<des_sim::StaticSite>>,
    }
    #[async_trait]
    impl EntityDispatch for Entry {
        async fn invoke(&self, _ordinal: u32, _args: &[Value]) -> Result<Value, EventError> {
            let site = self.site.lock().await.take().unwrap();
            prelude::run_static(site, vec![])
                .await
                .map_err(|e| EventError::msg(e.to_string()))?;
            Ok(Value::Null)
        }
        fn signature(&self, _ordinal: u32) -> String {
            "Entry.run()".to_string()
        }
    }

    kernel
        .post_event(
            Arc::new(Entry {
                site: Mutex::new(Some(site)),
            }),
            0,
            vec![],
        )
        .await
        .unwrap();
    kernel.run_loop(None).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn create_channel_round_trips_a_value_through_the_ambient_kernel() {
    let kernel = test_kernel();
    prelude::set_controller(Arc::clone(&kernel)).await;
    let channel = Arc::new(prelude::create_channel::<u32>().unwrap());

    struct Producer(Arc<des_channel::Channel<u32>>);
    #[async_trait]
    impl EntityDispatch for Producer {
        async fn invoke(&self, _ordinal: u32, _args: &[Value]) -> Result<Value, EventError> {
            self.0.put(5).await.map_err(|e| EventError::msg(e.to_string()))?;
            Ok(Value::Null)
        }
        fn signature(&self, _ordinal: u32) -> String {
            "Producer.run()".to_string()
        }
    }
    struct Consumer {
        channel: Arc<des_channel::Channel<u32>>,
        result: Mutex<Option<u32>>,
    }
    #[async_trait]
    impl EntityDispatch for Consumer {
        async fn invoke(&self, _ordinal: u32, _args: &[Value]) -> Result<Value, EventError> {
            let v = self.channel.take().await.map_err(|e| EventError::msg(e.to_string()))?;
            *self.result.lock().await = Some(v);
            Ok(Value::Null)
        }
        fn signature(&self, _ordinal: u32) -> String {
            "Consumer.run()".to_string()
        }
    }

    let consumer = Arc::new(Consumer {
        channel: channel.clone(),
        result: Mutex::new(None),
    });
    kernel.post_event(Arc::new(Producer(channel.clone())), 0, vec![]).await.unwrap();
    kernel.post_event(consumer.clone(), 0, vec![]).await.unwrap();
    kernel.run_loop(None).await.unwrap();
    assert_eq!(*consumer.result.lock().await, Some(5));
}

#[tokio::test]
async fn echo_entity_fixture_works_through_a_blocking_call() {
    let kernel = test_kernel();
    let echo = Arc::new(EchoEntity::new());

    struct Entry {
        echo: Arc<EchoEntity>,
        out: Mutex<Option<Value>>,
    }
    #[async_trait]
    impl EntityDispatch for Entry {
        async fn invoke(&self, _ordinal: u32, _args: &[Value]) -> Result<Value, EventError> {
            let kernel = prelude::get_controller().map_err(|e| EventError::msg(e.to_string()))?;
            let v = kernel
                .post_continuing(self.echo.clone(), 0, vec![Value::from("ping")])
                .await
                .map_err(|e| EventError::msg(e.to_string()))?;
            *self.out.lock().await = Some(v);
            Ok(Value::Null)
        }
        fn signature(&self, _ordinal: u32) -> String {
            "Entry.run()".to_string()
        }
    }

    prelude::set_controller(Arc::clone(&kernel)).await;
    let entry = Arc::new(Entry {
        echo: echo.clone(),
        out: Mutex::new(None),
    });
    kernel.post_event(entry.clone(), 0, vec![]).await.unwrap();
    kernel.run_loop(None).await.unwrap();
    assert_eq!(*entry.out.lock().await, Some(Value::from("ping")));
    assert_eq!(echo.invocation_count(), 1);
}
