//! 通过 actor（spawn_player）驱动的端到端播放流程

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use queue_player::catalog::MemoryCatalog;
use queue_player::domain::{CategoryType, MediaId, TrackMetadata};
use queue_player::focus::{FocusChange, FocusHub, FocusRequestKind, FocusState, FocusSystem};
use queue_player::messages::{Extras, SessionEvent};
use queue_player::renderer::{NullMode, NullRendererFactory, NullRendererHandle, RendererCall};
use queue_player::settings::PlayerSettings;
use queue_player::{PlaybackSnapshot, PlaybackState, PlayerService, spawn_player};

const WAIT: Duration = Duration::from_secs(5);

fn catalog(track_ms: Option<u64>) -> MemoryCatalog {
    let tracks = (1..=3)
        .map(|n| TrackMetadata {
            id: n.to_string(),
            title: format!("Track {n}"),
            album: "Blue".to_owned(),
            artist: "Miles".to_owned(),
            genre: "Jazz".to_owned(),
            source: format!("/music/{n}.mp3"),
            duration_ms: track_ms,
            ..Default::default()
        })
        .collect();
    MemoryCatalog::new(tracks)
}

fn album() -> MediaId {
    MediaId::new(None, &[CategoryType::Album.as_str(), "Blue"])
}

fn start(mode: NullMode, track_ms: Option<u64>, hub: &FocusHub) -> (PlayerService, NullRendererHandle) {
    let factory = NullRendererFactory::new(mode);
    let handle = factory.handle();
    let service = spawn_player(
        Arc::new(catalog(track_ms)),
        Box::new(factory),
        hub,
        &PlayerSettings::default(),
    );
    (service, handle)
}

fn simulated() -> NullMode {
    NullMode::Simulated {
        default_track_ms: 60_000,
    }
}

/// 丢弃其他事件，直到出现满足条件的状态快照
async fn wait_state(
    service: &mut PlayerService,
    pred: impl Fn(&PlaybackSnapshot) -> bool,
) -> PlaybackSnapshot {
    timeout(WAIT, async {
        loop {
            match service.events.recv().await {
                Some(SessionEvent::PlaybackState(s)) if pred(&s) => return *s,
                Some(_) => {}
                None => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for snapshot")
}

async fn play_album(service: &mut PlayerService) -> PlaybackSnapshot {
    service
        .surface
        .play_from_id(album(), Extras::new())
        .await
        .unwrap();
    wait_state(service, |s| s.state == PlaybackState::Playing).await
}

#[tokio::test]
async fn idle_snapshot_on_startup() {
    let hub = FocusHub::new();
    let (mut service, _) = start(NullMode::Manual, None, &hub);
    let s = wait_state(&mut service, |_| true).await;
    assert_eq!(s.state, PlaybackState::Idle);
    assert_eq!(s.active_queue_id, None);
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn album_plays_through_and_stops_at_end() {
    let hub = FocusHub::new();
    let (mut service, handle) = start(simulated(), Some(30), &hub);
    service
        .surface
        .play_from_id(album(), Extras::new())
        .await
        .unwrap();

    let mut playing_ids = Vec::new();
    let mut saw_queue = false;
    timeout(WAIT, async {
        loop {
            match service.events.recv().await {
                Some(SessionEvent::QueueUpdated { entries, .. }) => {
                    saw_queue = true;
                    let ids: Vec<u64> = entries.iter().map(|e| e.queue_id.0).collect();
                    assert_eq!(ids, vec![0, 1, 2]);
                }
                Some(SessionEvent::PlaybackState(s)) => match s.state {
                    PlaybackState::Playing => {
                        let id = s.active_queue_id.unwrap().0;
                        if playing_ids.last() != Some(&id) {
                            playing_ids.push(id);
                        }
                    }
                    PlaybackState::Stopped => break,
                    PlaybackState::Error => panic!("unexpected error: {:?}", s.error_message),
                    _ => {}
                },
                Some(_) => {}
                None => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("queue did not finish");

    assert!(saw_queue);
    assert_eq!(playing_ids, vec![0, 1, 2]);
    // 每首曲目一个新的 renderer，前一个都被释放
    assert_eq!(handle.created(), 3);
    assert_eq!(handle.count(|c| matches!(c, RendererCall::Release)), 3);
    assert_eq!(hub.holder(), None);
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn transient_focus_loss_pauses_then_resumes() {
    let hub = FocusHub::new();
    let (mut service, handle) = start(simulated(), None, &hub);
    play_album(&mut service).await;

    let (tx, _rx) = mpsc::channel::<FocusChange>(4);
    let mut other = hub.client("other-app", tx);
    other.request(FocusRequestKind::GainTransient);

    let paused = wait_state(&mut service, |s| s.state == PlaybackState::Paused).await;
    assert!(paused.resume_on_focus_regain);
    assert_eq!(paused.focus, FocusState::None);
    assert!(!handle.is_playing());

    other.abandon();
    let resumed = wait_state(&mut service, |s| s.state == PlaybackState::Playing).await;
    assert!(!resumed.resume_on_focus_regain);
    assert_eq!(resumed.focus, FocusState::Full);
    assert!(handle.is_playing());
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn duckable_focus_loss_keeps_playing_quietly() {
    let hub = FocusHub::new();
    let (mut service, handle) = start(simulated(), None, &hub);
    play_album(&mut service).await;
    assert!((handle.volume() - 1.0).abs() < f32::EPSILON);

    let (tx, _rx) = mpsc::channel::<FocusChange>(4);
    let mut other = hub.client("navigation", tx);
    other.request(FocusRequestKind::GainTransientMayDuck);

    let ducked = wait_state(&mut service, |s| s.focus == FocusState::DuckAllowed).await;
    assert_eq!(ducked.state, PlaybackState::Playing);
    assert!(!ducked.resume_on_focus_regain);
    assert!(handle.is_playing());
    assert!(handle.volume() < 1.0);
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn permanent_focus_loss_does_not_resume() {
    let hub = FocusHub::new();
    let (mut service, handle) = start(simulated(), None, &hub);
    play_album(&mut service).await;

    let (tx, _rx) = mpsc::channel::<FocusChange>(4);
    let mut other = hub.client("other-player", tx);
    other.request(FocusRequestKind::Gain);

    let paused = wait_state(&mut service, |s| s.state == PlaybackState::Paused).await;
    assert!(paused.resume_on_focus_regain);
    assert_eq!(hub.holder().as_deref(), Some("other-player"));

    // 永久失去焦点后不在焦点栈里，对方释放也不会收到 GAIN
    other.abandon();
    assert!(!handle.is_playing());
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn seek_without_renderer_applies_on_next_play() {
    let hub = FocusHub::new();
    let (mut service, handle) = start(simulated(), None, &hub);
    play_album(&mut service).await;

    service.surface.stop().await.unwrap();
    wait_state(&mut service, |s| s.state == PlaybackState::Stopped).await;

    service.surface.seek_to(5_000).await.unwrap();
    let s = wait_state(&mut service, |_| true).await;
    assert_eq!(s.state, PlaybackState::Stopped);
    assert_eq!(s.position_ms, 5_000);

    service.surface.play().await.unwrap();
    let playing = wait_state(&mut service, |s| s.state == PlaybackState::Playing).await;
    assert!(playing.position_ms >= 5_000);
    assert!(handle.calls().contains(&RendererCall::Seek(5_000)));
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn focus_denied_reports_error_without_loading() {
    let hub = FocusHub::new();
    hub.set_locked(true);
    let (mut service, handle) = start(NullMode::Manual, None, &hub);

    service
        .surface
        .play_from_id(album(), Extras::new())
        .await
        .unwrap();
    let s = wait_state(&mut service, |s| s.state == PlaybackState::Error).await;
    assert_eq!(s.error_message.as_deref(), Some("Audio focus denied"));
    assert_eq!(handle.created(), 0);
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn stop_twice_releases_once() {
    let hub = FocusHub::new();
    let (mut service, handle) = start(NullMode::Manual, None, &hub);

    service
        .surface
        .play_from_id(album(), Extras::new())
        .await
        .unwrap();
    wait_state(&mut service, |s| s.state == PlaybackState::Buffering).await;
    assert_eq!(hub.holder().as_deref(), Some(queue_player::coordinator::FOCUS_CLIENT_NAME));

    for _ in 0..2 {
        service.surface.stop().await.unwrap();
        let s = wait_state(&mut service, |s| s.state != PlaybackState::Buffering).await;
        assert_eq!(s.state, PlaybackState::Stopped);
    }
    assert_eq!(handle.count(|c| matches!(c, RendererCall::Release)), 1);
    assert_eq!(hub.holder(), None);
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn skip_past_end_reports_cannot_skip() {
    let hub = FocusHub::new();
    let (mut service, _) = start(NullMode::Manual, None, &hub);

    service
        .surface
        .play_from_id(MediaId::for_track("3", &CategoryType::Album, "Blue"), Extras::new())
        .await
        .unwrap();
    let s = wait_state(&mut service, |s| s.state == PlaybackState::Buffering).await;
    assert_eq!(s.active_queue_id.map(|id| id.0), Some(2));

    service.surface.skip_next().await.unwrap();
    let s = wait_state(&mut service, |s| s.state == PlaybackState::Error).await;
    assert_eq!(s.error_message.as_deref(), Some("Cannot skip"));
    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn commands_fail_after_shutdown() {
    let hub = FocusHub::new();
    let (service, _) = start(NullMode::Manual, None, &hub);
    let surface = service.surface.clone();
    service.shutdown().await.unwrap();
    assert!(surface.play().await.is_err());
}
