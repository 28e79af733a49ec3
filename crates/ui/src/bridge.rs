use std::sync::mpsc;
use std::thread;

use engine::{FfmpegMediaBackend, MediaBackend, MediaNotification, MediaRequest, serve_request};
use iced::Subscription;
use iced::futures::channel::mpsc as futures_mpsc;
use iced::futures::{SinkExt, Stream, StreamExt, executor, future, stream};
use tracing::debug;

const REQUEST_CHANNEL_CAPACITY: usize = 32;
const NOTIFICATION_CHANNEL_CAPACITY: usize = 8;

/// Sender used by the UI thread to hand work to the media worker.
pub type MediaRequestSender = mpsc::SyncSender<MediaRequest>;

/// Async side of the worker's notification channel.
pub type MediaNotificationReceiver = futures_mpsc::Receiver<MediaNotification>;

/// Messages emitted by the media bridge subscription.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    Ready(MediaRequestSender),
    Notification(MediaNotification),
    Disconnected,
}

/// Starts the media worker when subscribed and streams its notifications.
pub fn media_subscription() -> Subscription<BridgeEvent> {
    Subscription::run(ffmpeg_bridge_stream)
}

fn ffmpeg_bridge_stream() -> impl Stream<Item = BridgeEvent> {
    bridge_stream(spawn_media_worker(FfmpegMediaBackend))
}

/// `Ready` first, then every notification, then `Disconnected` once the
/// worker has stopped.
fn bridge_stream(
    (request_tx, notifications): (MediaRequestSender, MediaNotificationReceiver),
) -> impl Stream<Item = BridgeEvent> {
    stream::once(future::ready(BridgeEvent::Ready(request_tx)))
        .chain(notifications.map(BridgeEvent::Notification))
        .chain(stream::once(future::ready(BridgeEvent::Disconnected)))
}

/// Spawns a worker thread that owns `backend` and serves requests in order.
///
/// The worker stops when every request sender is dropped or the
/// notification receiver goes away.
pub fn spawn_media_worker<M>(backend: M) -> (MediaRequestSender, MediaNotificationReceiver)
where
    M: MediaBackend + Send + 'static,
{
    let (request_tx, request_rx) = mpsc::sync_channel::<MediaRequest>(REQUEST_CHANNEL_CAPACITY);
    let (mut notification_tx, notification_rx) =
        futures_mpsc::channel::<MediaNotification>(NOTIFICATION_CHANNEL_CAPACITY);

    thread::spawn(move || {
        while let Ok(request) = request_rx.recv() {
            let notification = serve_request(&backend, request);
            if executor::block_on(notification_tx.send(notification)).is_err() {
                debug!("media worker stopped: notification receiver dropped");
                return;
            }
        }
        debug!("media worker stopped: request channel closed");
    });

    (request_tx, notification_rx)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine::{EngineError, MediaMetadata, PreviewFrame, VideoSource, VideoTrackInfo};
    use iced::futures::{StreamExt, executor, pin_mut};

    use super::{
        BridgeEvent, MediaBackend, MediaNotification, MediaRequest, bridge_stream,
        spawn_media_worker,
    };

    #[derive(Debug, Clone, Copy)]
    struct MockBackend;

    impl MediaBackend for MockBackend {
        fn probe(&self, source: &VideoSource) -> engine::Result<MediaMetadata> {
            if source.as_str().contains("offline") {
                return Err(EngineError::NoVideoSource);
            }
            Ok(MediaMetadata {
                duration_seconds: Some(10.0),
                video: VideoTrackInfo {
                    width: 160,
                    height: 90,
                    codec: Some("h264".to_owned()),
                },
            })
        }

        fn decode_preview_frame(
            &self,
            _source: &VideoSource,
            _at_seconds: f64,
            width: u32,
            height: u32,
        ) -> engine::Result<PreviewFrame> {
            Ok(PreviewFrame {
                width,
                height,
                bytes: Arc::from(vec![0; (width * height * 4) as usize]),
            })
        }
    }

    fn source(url: &str) -> VideoSource {
        VideoSource::parse(url).expect("valid url")
    }

    #[test]
    fn worker_answers_load_and_decode_requests_in_order() {
        let (request_tx, mut notification_rx) = spawn_media_worker(MockBackend);

        request_tx
            .send(MediaRequest::Load {
                generation: 1,
                source: source("https://example.com/a.mp4"),
            })
            .expect("send load request");
        request_tx
            .send(MediaRequest::DecodeFrame {
                generation: 1,
                source: source("https://example.com/a.mp4"),
                at_seconds: 0.0,
                width: 4,
                height: 2,
            })
            .expect("send decode request");

        let first = executor::block_on(notification_rx.next()).expect("load notification");
        let second = executor::block_on(notification_rx.next()).expect("frame notification");

        assert!(matches!(first, MediaNotification::Loaded { generation: 1, .. }));
        let MediaNotification::FrameReady { frame, .. } = second else {
            panic!("expected FrameReady");
        };
        assert_eq!(frame.bytes.len(), 32);
    }

    #[test]
    fn worker_reports_load_failures_with_generation() {
        let (request_tx, mut notification_rx) = spawn_media_worker(MockBackend);

        request_tx
            .send(MediaRequest::Load {
                generation: 3,
                source: source("https://offline.example.com/a.mp4"),
            })
            .expect("send load request");

        let notification =
            executor::block_on(notification_rx.next()).expect("load failure notification");

        let MediaNotification::LoadFailed {
            generation, code, ..
        } = notification
        else {
            panic!("expected LoadFailed");
        };
        assert_eq!(generation, 3);
        assert_eq!(code, None);
    }

    #[test]
    fn bridge_stream_emits_ready_then_notifications_then_disconnected() {
        let stream = bridge_stream(spawn_media_worker(MockBackend));
        pin_mut!(stream);

        let Some(BridgeEvent::Ready(request_tx)) = executor::block_on(stream.next()) else {
            panic!("expected BridgeEvent::Ready");
        };
        request_tx
            .send(MediaRequest::Load {
                generation: 1,
                source: source("https://example.com/a.mp4"),
            })
            .expect("send load request");

        assert!(matches!(
            executor::block_on(stream.next()),
            Some(BridgeEvent::Notification(MediaNotification::Loaded { .. }))
        ));

        drop(request_tx);

        assert!(matches!(
            executor::block_on(stream.next()),
            Some(BridgeEvent::Disconnected)
        ));
        assert!(executor::block_on(stream.next()).is_none());
    }
}
