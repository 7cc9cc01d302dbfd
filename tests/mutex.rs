use nebula_sync::sync::{Event, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_mutex_protects_non_atomic_counter() {
    let counter = Arc::new(Mutex::new(0usize).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..1_000 {
                    let mut guard = counter.lock().unwrap();
                    let value = *guard;
                    thread::yield_now();
                    *guard = value + 1;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*counter.lock().unwrap(), 8_000);
}

#[test]
fn test_mutex_no_two_threads_inside_critical_section() {
    let mutex = Arc::new(Mutex::new(()).unwrap());
    let inside = Arc::new(AtomicBool::new(false));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let mutex = mutex.clone();
            let inside = inside.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    let guard = mutex.lock().unwrap();
                    assert!(
                        !inside.swap(true, Ordering::SeqCst),
                        "two threads held the lock at once"
                    );
                    thread::yield_now();
                    inside.store(false, Ordering::SeqCst);
                    guard.unlock().unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_lock_blocks_until_holder_unlocks() {
    let mutex = Mutex::new(()).unwrap();
    let locked = Event::new().unwrap();

    thread::scope(|s| {
        s.spawn(|| {
            let guard = mutex.lock().unwrap();
            locked.signal().unwrap();
            thread::sleep(Duration::from_millis(100));
            guard.unlock().unwrap();
        });

        locked.wait(5_000).unwrap();

        let start = Instant::now();
        let guard = mutex.lock().unwrap();
        let elapsed = start.elapsed();
        drop(guard);

        assert!(
            elapsed >= Duration::from_millis(90),
            "lock returned after {elapsed:?} while another thread held it"
        );
    });
}

#[test]
fn test_guard_drop_releases_lock() {
    let mutex = Mutex::new(1).unwrap();

    {
        let mut guard = mutex.lock().unwrap();
        *guard += 1;
    }

    let guard = mutex.lock().unwrap();
    assert_eq!(*guard, 2);
}

#[test]
fn test_destroy_returns_value() {
    let mut mutex = Mutex::new(String::from("session")).unwrap();
    mutex.get_mut().push_str("-state");

    let value = mutex.destroy().unwrap();
    assert_eq!(value, "session-state");
}

#[test]
fn test_default_mutex_is_opaque_lock() {
    let mutex: Mutex = Mutex::new(()).unwrap();

    mutex.lock().unwrap().unlock().unwrap();
    mutex.destroy().unwrap();
}
