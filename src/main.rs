use elastic_pool::{Config, ThreadPool};
use std::time::{Duration, Instant};

fn print_task(idx: usize) {
    println!("hello world from task {idx}");
}

fn fib(idx: usize) -> u64 {
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..idx {
        let next = a.wrapping_add(b);
        a = b;
        b = next;
    }
    a
}

fn mul(x: i64, y: i64) -> i64 {
    x * y
}

fn main() {
    env_logger::init();

    // fixed mode
    {
        let pool = ThreadPool::new(Config::default());
        println!("----------------------test1----------------------");
        pool.run();
        for i in 0..100 {
            let _ = pool.submit(move || print_task(i));
        }
        pool.shut_down();

        println!("----------------------test2----------------------");
        pool.run();
        let handles: Vec<_> = (0..100).map(|i| pool.submit(move || fib(i))).collect();
        for handle in handles {
            match handle.into_result() {
                Ok(value) => print!("{value} "),
                Err(err) => print!("<{err}> "),
            }
        }
        println!();
    }

    // cached mode, with a short idle window so the shrink is visible
    {
        let pool = ThreadPool::new(Config {
            idle_timeout: Duration::from_secs(2),
            poll_interval: Duration::from_millis(200),
            ..Config::cached(8, 16)
        });
        println!("----------------------test3----------------------");
        pool.run();
        for i in 0..32 {
            let _ = pool.submit(move || print_task(i));
        }
        println!("Now number of threads {}", pool.size());
        pool.shut_down();

        println!("----------------------test4----------------------");
        pool.run();
        let handles: Vec<_> = (0..100)
            .map(|i| pool.submit(move || mul(i, i + 1)))
            .collect();

        // wait out the idle window so the extra workers retire
        let deadline = Instant::now() + Duration::from_secs(10);
        while pool.size() > 8 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(100));
        }
        println!("Now number of threads {}", pool.size());
        for handle in handles {
            match handle.into_result() {
                Ok(value) => print!("{value} "),
                Err(err) => print!("<{err}> "),
            }
        }
        println!();
    }
}
