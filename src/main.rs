use classroom_sentinel::common::Frame;
use classroom_sentinel::pipeline::ports::LatestFrameSource;
use classroom_sentinel::pipeline::{load_gallery, GalleryLoad, JsonDescriptorSource};
use classroom_sentinel::{AppError, Configuration, Coordinator};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::{info, warn, Level};

fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let configuration = Configuration::load(config_path.as_deref())?;
    init_logging(&configuration.log_level);

    let descriptors = JsonDescriptorSource::new(&configuration.gallery_dir);
    let GalleryLoad { gallery, errors } =
        load_gallery(&configuration.gallery_labels, &descriptors).await;
    if !errors.is_empty() {
        warn!("{} gallery labels could not be loaded", errors.len());
    }

    let (frame_source, publisher) = LatestFrameSource::channel();
    if let Some(path) = &configuration.still_image {
        publisher.publish(Frame::capture(image::open(path)?));
        info!("Publishing still image {}", path.display());
    }

    let coordinator = Coordinator::builder(configuration)
        .gallery(gallery)
        .frame_source(Arc::new(frame_source))
        .build()?;
    coordinator.start()?;

    let mut updates = WatchStream::new(coordinator.subscribe());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            Some(snapshot) = updates.next() => {
                info!(
                    session = snapshot.session,
                    attendance = ?snapshot.state.attendance(),
                    raised_hands = snapshot.state.hand_raise_count(),
                    object = ?snapshot.state.last_detected_object(),
                    "Session updated"
                );
            }
        }
    }

    coordinator.stop()?;
    let stats = coordinator.stats();
    info!(
        ticks = stats.ticks_fired,
        cycles = stats.cycles_completed,
        skipped_ticks = stats.ticks_skipped,
        frames_unavailable = stats.frames_unavailable,
        "Shutting down"
    );
    Ok(())
}
