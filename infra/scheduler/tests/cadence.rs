use fcs_scheduler::{PollScheduler, PollSpec};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

const CADENCE: Duration = Duration::from_millis(100);

fn counter() -> (Arc<AtomicUsize>, impl Fn() -> std::future::Ready<()> + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&count);
    (count, move || {
        hits.fetch_add(1, Ordering::SeqCst);
        std::future::ready(())
    })
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[tokio::test(start_paused = true)]
async fn first_tick_waits_one_interval() {
    let scheduler = PollScheduler::new();
    let (count, callback) = counter();
    scheduler.register("setup_data_pull_fast", PollSpec::every(CADENCE), callback).unwrap();

    sleep(ms(50)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);

    sleep(ms(300)).await;
    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert_eq!(scheduler.ticks("setup_data_pull_fast"), 3);
}

#[tokio::test(start_paused = true)]
async fn immediate_task_fires_on_registration() {
    let scheduler = PollScheduler::new();
    let (count, callback) = counter();
    scheduler.register("status_pull", PollSpec::every(CADENCE).immediate(), callback).unwrap();

    sleep(ms(50)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    sleep(ms(100)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn one_shot_fires_once_then_deregisters() {
    let scheduler = PollScheduler::new();
    let (count, callback) = counter();
    scheduler.register("button_reset", PollSpec::once_after(ms(2000)), callback).unwrap();
    assert!(scheduler.is_registered("button_reset"));

    sleep(ms(1999)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);

    sleep(ms(2000)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(!scheduler.is_registered("button_reset"));
    assert!(scheduler.names().is_empty());
}

#[tokio::test(start_paused = true)]
async fn duplicate_name_replaces_previous_task() {
    let scheduler = PollScheduler::new();
    let (first, first_cb) = counter();
    let (second, second_cb) = counter();

    scheduler.register("poll", PollSpec::every(CADENCE), first_cb).unwrap();
    sleep(ms(150)).await;
    assert_eq!(first.load(Ordering::SeqCst), 1);

    scheduler.register("poll", PollSpec::every(CADENCE), second_cb).unwrap();
    sleep(ms(250)).await;

    assert_eq!(first.load(Ordering::SeqCst), 1, "replaced task must not tick again");
    assert_eq!(second.load(Ordering::SeqCst), 2);
    assert_eq!(scheduler.names(), vec!["poll".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn resume_restarts_cadence_from_zero() {
    let scheduler = PollScheduler::new();
    let (count, callback) = counter();
    scheduler.register("fast", PollSpec::every(CADENCE), callback).unwrap();

    sleep(ms(150)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);

    assert!(scheduler.pause("fast"));
    assert!(scheduler.is_paused("fast"));
    sleep(ms(300)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1, "paused task must not tick");
    assert!(scheduler.is_registered("fast"));

    assert!(scheduler.resume("fast"));
    sleep(ms(99)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1, "first tick comes a full interval after resume");
    sleep(ms(2)).await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn pause_then_immediate_resume_keeps_tick_count() {
    let scheduler = PollScheduler::new();
    let (count, callback) = counter();
    scheduler.register("fast", PollSpec::every(CADENCE), callback).unwrap();

    sleep(ms(50)).await;
    scheduler.pause("fast");
    scheduler.resume("fast");
    sleep(ms(300)).await;

    assert_eq!(count.load(Ordering::SeqCst), 3);
    assert!(!scheduler.is_paused("fast"));
}

#[tokio::test(start_paused = true)]
async fn slow_callbacks_do_not_block_the_cadence() {
    let scheduler = PollScheduler::new();
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let (r, p) = (Arc::clone(&running), Arc::clone(&peak));
    scheduler
        .register("slow_link", PollSpec::every(CADENCE), move || {
            let (r, p) = (Arc::clone(&r), Arc::clone(&p));
            async move {
                let now = r.fetch_add(1, Ordering::SeqCst) + 1;
                p.fetch_max(now, Ordering::SeqCst);
                sleep(ms(250)).await;
                r.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .unwrap();

    sleep(ms(350)).await;
    assert_eq!(scheduler.ticks("slow_link"), 3);
    assert!(peak.load(Ordering::SeqCst) >= 2, "ticks overlap instead of queueing");
}

#[tokio::test(start_paused = true)]
async fn unregister_and_clear_cancel_immediately() {
    let scheduler = PollScheduler::new();
    let (fast, fast_cb) = counter();
    let (slow, slow_cb) = counter();
    let (status, status_cb) = counter();
    scheduler.register("fast", PollSpec::every(CADENCE), fast_cb).unwrap();
    scheduler.register("slow", PollSpec::every(ms(250)), slow_cb).unwrap();
    scheduler.register("status", PollSpec::every(ms(250)), status_cb).unwrap();

    sleep(ms(120)).await;
    assert!(scheduler.unregister("fast"));
    assert!(!scheduler.unregister("fast"));
    assert!(!scheduler.pause("fast"));

    assert_eq!(scheduler.clear(), 2);
    sleep(ms(1000)).await;

    assert_eq!(fast.load(Ordering::SeqCst), 1);
    assert_eq!(slow.load(Ordering::SeqCst), 0);
    assert_eq!(status.load(Ordering::SeqCst), 0);
    assert!(scheduler.names().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_scheduler_cancels_its_tasks() {
    let (count, callback) = counter();
    {
        let scheduler = PollScheduler::new();
        scheduler.register("fast", PollSpec::every(CADENCE), callback).unwrap();
        sleep(ms(150)).await;
    }
    sleep(ms(500)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
