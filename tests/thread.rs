use nebula_sync::sync::{Event, Mutex};
use nebula_sync::thread::{self, Builder, NameStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn test_start_passes_argument() {
    let done = Arc::new(Event::new().unwrap());
    let seen = Arc::new(Mutex::new(None).unwrap());

    let (worker_done, worker_seen) = (done.clone(), seen.clone());
    thread::start(
        move |value: u32| {
            *worker_seen.lock().unwrap() = Some(value);
            worker_done.signal().unwrap();
        },
        42,
    )
    .unwrap();

    done.wait(5_000).unwrap();
    assert_eq!(*seen.lock().unwrap(), Some(42));
}

#[test]
fn test_many_detached_threads_all_run() {
    let finished = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(Event::new().unwrap());

    for _ in 0..32 {
        let finished = finished.clone();
        let done = done.clone();
        thread::spawn(move || {
            if finished.fetch_add(1, Ordering::SeqCst) + 1 == 32 {
                done.signal().unwrap();
            }
        })
        .unwrap();
    }

    done.wait(10_000).unwrap();
    assert_eq!(finished.load(Ordering::SeqCst), 32);
}

#[test]
fn test_thread_ids_differ_between_threads() {
    let here = thread::current_thread_id();
    assert_eq!(here, thread::current_thread_id());

    let done = Arc::new(Event::new().unwrap());
    let there = Arc::new(Mutex::new(None).unwrap());

    let (worker_done, worker_there) = (done.clone(), there.clone());
    thread::spawn(move || {
        *worker_there.lock().unwrap() = Some(thread::current_thread_id());
        worker_done.signal().unwrap();
    })
    .unwrap();

    done.wait(5_000).unwrap();

    let there = there.lock().unwrap().expect("worker recorded its id");
    assert_ne!(here, there);
    assert!(!here.to_string().is_empty());
}

#[test]
fn test_set_name_never_fails() {
    let done = Arc::new(Event::new().unwrap());
    let worker_done = done.clone();

    thread::spawn(move || {
        for name in ["", "io", "a-name-much-longer-than-fifteen-bytes", "nul\0inside", "é"] {
            let status = thread::set_current_thread_name(name);
            assert!(matches!(status, NameStatus::Applied | NameStatus::Skipped));
        }
        worker_done.signal().unwrap();
    })
    .unwrap();

    done.wait(5_000).unwrap();
}

#[cfg(any(target_os = "linux", target_os = "macos", windows))]
#[test]
fn test_set_name_applied_on_supported_platforms() {
    let done = Arc::new(Event::new().unwrap());
    let status = Arc::new(Mutex::new(None).unwrap());

    let (worker_done, worker_status) = (done.clone(), status.clone());
    thread::spawn(move || {
        *worker_status.lock().unwrap() = Some(thread::set_current_thread_name("nebula-worker"));
        worker_done.signal().unwrap();
    })
    .unwrap();

    done.wait(5_000).unwrap();

    let status = status.lock().unwrap().expect("worker recorded naming status");
    if cfg!(windows) {
        // Older Windows versions do not export SetThreadDescription.
        assert!(matches!(status, NameStatus::Applied | NameStatus::Skipped));
    } else {
        assert_eq!(status, NameStatus::Applied);
    }
}

#[cfg(target_os = "linux")]
#[test]
fn test_builder_name_is_visible_to_the_os() {
    let done = Arc::new(Event::new().unwrap());
    let name = Arc::new(Mutex::new(Vec::new()).unwrap());

    let (worker_done, worker_name) = (done.clone(), name.clone());
    Builder::new()
        .name("nebula-receive-loop")
        .spawn(move || {
            let mut buf = [0u8; 32];
            let rc = unsafe {
                libc::pthread_getname_np(
                    libc::pthread_self(),
                    buf.as_mut_ptr() as *mut libc::c_char,
                    buf.len(),
                )
            };
            assert_eq!(rc, 0);

            let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
            *worker_name.lock().unwrap() = buf[..len].to_vec();
            worker_done.signal().unwrap();
        })
        .unwrap();

    done.wait(5_000).unwrap();
    assert_eq!(name.lock().unwrap().as_slice(), b"nebula-receive-");
}

#[test]
fn test_builder_rounds_up_tiny_stack() {
    let done = Arc::new(Event::new().unwrap());
    let worker_done = done.clone();

    Builder::new()
        .stack_size(1)
        .start(move |event: Arc<Event>| event.signal().unwrap(), worker_done)
        .unwrap();

    done.wait(5_000).unwrap();
}

#[test]
fn test_builder_with_large_stack() {
    let done = Arc::new(Event::new().unwrap());
    let worker_done = done.clone();

    Builder::new()
        .name("deep")
        .stack_size(4 * 1024 * 1024)
        .spawn(move || {
            let buf = [1u8; 1024 * 1024];
            assert_eq!(buf.iter().map(|&b| b as usize).sum::<usize>(), 1024 * 1024);
            worker_done.signal().unwrap();
        })
        .unwrap();

    done.wait(5_000).unwrap();
}

#[test]
#[should_panic(expected = "stack_size must be > 0")]
fn test_builder_rejects_zero_stack() {
    let _ = Builder::new().stack_size(0);
}

#[test]
fn test_panicking_thread_does_not_affect_caller() {
    thread::spawn(|| panic!("worker failure")).unwrap();

    let done = Arc::new(Event::new().unwrap());
    let worker_done = done.clone();
    thread::spawn(move || worker_done.signal().unwrap()).unwrap();

    done.wait(5_000).unwrap();
}
