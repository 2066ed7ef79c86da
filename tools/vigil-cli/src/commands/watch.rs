//! Watch the camera and raise alarms.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use vigil_camera::{HighGuiDisplay, OpenCvCamera};
use vigil_common::clock::MonitorClock;
use vigil_common::config::AppConfig;
use vigil_common::error::VigilResult;
use vigil_detect::{policy_from_config, MotionDetector};
use vigil_monitor::{prepare, Display, HeadlessDisplay, Monitor, Prepared};
use vigil_notify::{AlertDispatcher, AlertPlanner, SoundPlayer, TelegramNotifier};

/// Grace period for in-flight notifications at exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let prepared = prepare(|key| std::env::var(key).ok(), || {
        OpenCvCamera::open(&config.camera)
    });
    let Some(Prepared {
        credentials,
        mut source,
    }) = ready_or_bail(prepared)
    else {
        return Ok(());
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("vigil-notify")
        .enable_all()
        .build()?;

    let telegram = TelegramNotifier::new(&credentials, &config.notify)?;
    let sound = SoundPlayer::load(&config.notify.sound_file);
    let dispatcher = AlertDispatcher::new(
        runtime.handle().clone(),
        telegram,
        sound.clone(),
        AlertPlanner::new(&config.notify, &config.alarm),
    );

    let mut display: Box<dyn Display> = if config.display.headless {
        tracing::info!("Running headless; stop with Ctrl+C");
        Box::new(HeadlessDisplay::new(Duration::from_millis(
            config.display.poll_interval_ms,
        )))
    } else {
        Box::new(HighGuiDisplay::open(&config.display)?)
    };

    let policy = policy_from_config(&config.alarm);
    tracing::info!(
        policy = policy.name(),
        motion_threshold = config.detection.motion_threshold,
        "Press 't' to toggle monitoring, 'q' to quit"
    );

    let mut monitor = Monitor::new(
        MotionDetector::new(config.detection),
        policy,
        Box::new(dispatcher),
        MonitorClock::start(),
    );
    watch_ctrl_c(&runtime, monitor.interrupt_flag());

    let result = monitor.run(&mut source, display.as_mut());

    drop(display);
    drop(source);
    if let Some(sound) = &sound {
        sound.shutdown();
    }
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);

    let stats = result?;
    println!(
        "Stopped after {} frames ({} analysed), {} alerts",
        stats.frames_read, stats.frames_analysed, stats.alerts
    );
    Ok(())
}

/// Missing credentials or an unavailable camera end the command early
/// without an error exit.
fn ready_or_bail<S>(prepared: VigilResult<Prepared<S>>) -> Option<Prepared<S>> {
    match prepared {
        Ok(prepared) => Some(prepared),
        Err(e) => {
            tracing::error!(error = %e, "Cannot start monitoring");
            eprintln!("{e}");
            None
        }
    }
}

/// Turn Ctrl+C into a request for the monitor loop to stop, so cleanup runs
/// on the normal path.
fn watch_ctrl_c(runtime: &tokio::runtime::Runtime, interrupted: Arc<AtomicBool>) {
    runtime.spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl+C received, stopping");
                interrupted.store(true, Ordering::SeqCst);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });
}
