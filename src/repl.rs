use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use queue_player::coordinator::{PlaybackAction, PlaybackSnapshot};
use queue_player::domain::{CategoryType, MediaId};
use queue_player::error::AppError;
use queue_player::focus::{FocusClient, FocusHub, FocusRequestKind, FocusSystem};
use queue_player::messages::{Extras, SessionEvent, TransportCommand};
use queue_player::queue::QueueId;
use queue_player::{PlaybackState, PlayerService};

/// 模拟另一个应用抢占/归还音频焦点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtherApp {
    Duck,
    Interrupt,
    Steal,
    Release,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Transport(TransportCommand),
    OtherApp(OtherApp),
    Lock(bool),
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  play                      resume / play current queue (random if empty)
  play <type> <value>       play a category (album, artist, genre)
  id <media id>             play from a media id, e.g. __BY_ALBUM__/Blue|3
  search <query>            play search results
  queue <n>                 jump to queue entry n
  pause | stop | next | prev
  seek <ms>
  duck | interrupt | steal  another app takes audio focus
  release                   the other app gives focus back
  lock | unlock             deny / allow focus requests (call in progress)
  help | quit";

pub fn parse_line(line: &str) -> Result<Option<ReplCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (line, ""),
    };
    let cmd = match head {
        "play" if rest.is_empty() => ReplCommand::Transport(TransportCommand::Play),
        "play" => {
            let Some((ty, value)) = rest.split_once(char::is_whitespace) else {
                return Err("usage: play <type> <value>".to_owned());
            };
            let category_type = CategoryType::parse(ty);
            let media_id = MediaId::new(None, &[category_type.as_str(), value.trim()]);
            ReplCommand::Transport(TransportCommand::PlayFromId {
                media_id,
                extras: Extras::new(),
            })
        }
        "id" => {
            let media_id: MediaId = rest.parse().map_err(|e| format!("{e}"))?;
            ReplCommand::Transport(TransportCommand::PlayFromId {
                media_id,
                extras: Extras::new(),
            })
        }
        "search" => ReplCommand::Transport(TransportCommand::PlayFromSearch {
            query: rest.to_owned(),
            extras: Extras::new(),
        }),
        "queue" => {
            let n = rest
                .parse::<u64>()
                .map_err(|_| "usage: queue <n>".to_owned())?;
            ReplCommand::Transport(TransportCommand::SkipToQueueItem(QueueId(n)))
        }
        "seek" => {
            let ms = rest
                .parse::<u64>()
                .map_err(|_| "usage: seek <ms>".to_owned())?;
            ReplCommand::Transport(TransportCommand::SeekTo(ms))
        }
        "pause" => ReplCommand::Transport(TransportCommand::Pause),
        "stop" => ReplCommand::Transport(TransportCommand::Stop),
        "next" => ReplCommand::Transport(TransportCommand::SkipNext),
        "prev" => ReplCommand::Transport(TransportCommand::SkipPrevious),
        "duck" => ReplCommand::OtherApp(OtherApp::Duck),
        "interrupt" => ReplCommand::OtherApp(OtherApp::Interrupt),
        "steal" => ReplCommand::OtherApp(OtherApp::Steal),
        "release" => ReplCommand::OtherApp(OtherApp::Release),
        "lock" => ReplCommand::Lock(true),
        "unlock" => ReplCommand::Lock(false),
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => return Err(format!("unknown command: {other} (try `help`)")),
    };
    Ok(Some(cmd))
}

fn other_app(client: &mut FocusClient, action: OtherApp) {
    let kind = match action {
        OtherApp::Duck => FocusRequestKind::GainTransientMayDuck,
        OtherApp::Interrupt => FocusRequestKind::GainTransient,
        OtherApp::Steal => FocusRequestKind::Gain,
        OtherApp::Release => {
            client.abandon();
            println!("[{}] focus released", client.name());
            return;
        }
    };
    let grant = client.request(kind);
    println!("[{}] {kind:?} -> {grant:?}", client.name());
}

fn format_snapshot(s: &PlaybackSnapshot) -> String {
    let mut line = format!("[{:?}] {:.1}s", s.state, s.position_ms as f64 / 1000.0);
    if let Some(id) = s.active_queue_id {
        line.push_str(&format!(" queue=#{id}"));
    }
    line.push_str(&format!(" focus={:?}", s.focus));
    if s.resume_on_focus_regain {
        line.push_str(" (resume on focus)");
    }
    if s.can(PlaybackAction::Pause) {
        line.push_str(" [pausable]");
    }
    if let Some(err) = &s.error_message {
        line.push_str(&format!(" error: {err}"));
    }
    line
}

fn print_event(evt: &SessionEvent) {
    match evt {
        SessionEvent::PlaybackState(s) => println!("{}", format_snapshot(s)),
        SessionEvent::QueueUpdated { title, entries } => {
            println!("queue: {title} ({} tracks)", entries.len());
            for e in entries {
                println!("  #{} {}", e.queue_id, e.track.display_title());
            }
        }
        SessionEvent::MetadataChanged(track) => {
            println!("now: {} [{}]", track.display_title(), track.album);
        }
        SessionEvent::MetadataError(media_id) => println!("no metadata for {media_id}"),
        SessionEvent::Notification(signal) => tracing::debug!(?signal, "notification"),
    }
}

pub async fn run(mut service: PlayerService, hub: FocusHub) -> Result<(), AppError> {
    let (tx_other, mut rx_other) = mpsc::channel(8);
    let mut other = hub.client("other-app", tx_other);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        tokio::select! {
            maybe_evt = service.events.recv() => {
                let Some(evt) = maybe_evt else {
                    break;
                };
                print_event(&evt);
            }
            Some(change) = rx_other.recv() => {
                println!("[{}] focus {change:?}", other.name());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(ReplCommand::Quit)) => break,
                    Ok(Some(ReplCommand::Help)) => println!("{HELP}"),
                    Ok(Some(ReplCommand::Transport(cmd))) => service.surface.send(cmd).await?,
                    Ok(Some(ReplCommand::OtherApp(action))) => other_app(&mut other, action),
                    Ok(Some(ReplCommand::Lock(locked))) => {
                        hub.set_locked(locked);
                        println!("focus {}", if locked { "locked" } else { "unlocked" });
                    }
                    Err(msg) => println!("{msg}"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    drop(other);
    service.shutdown().await?;
    Ok(())
}

/// 播放一个分类直到停止；出错时以错误退出
pub async fn play_to_end(
    mut service: PlayerService,
    category_type: &str,
    category_value: &str,
) -> Result<(), AppError> {
    let media_id = MediaId::new(
        None,
        &[CategoryType::parse(category_type).as_str(), category_value],
    );
    tracing::info!(%media_id, "播放到队列结束");
    service
        .surface
        .play_from_id(media_id, Extras::new())
        .await?;

    let mut started = false;
    let mut failure = None;
    loop {
        tokio::select! {
            maybe_evt = service.events.recv() => {
                let Some(evt) = maybe_evt else {
                    break;
                };
                print_event(&evt);
                let SessionEvent::PlaybackState(s) = &evt else {
                    continue;
                };
                match s.state {
                    PlaybackState::Buffering | PlaybackState::Playing => started = true,
                    PlaybackState::Error => {
                        failure = s.error_message.clone();
                        break;
                    }
                    PlaybackState::Stopped if started => break,
                    _ => {}
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    service.shutdown().await?;
    match failure {
        Some(msg) => Err(AppError::Other(msg)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transport_commands() {
        assert_eq!(
            parse_line("play").unwrap(),
            Some(ReplCommand::Transport(TransportCommand::Play))
        );
        assert_eq!(
            parse_line("  seek 5000 ").unwrap(),
            Some(ReplCommand::Transport(TransportCommand::SeekTo(5000)))
        );
        assert_eq!(
            parse_line("queue 2").unwrap(),
            Some(ReplCommand::Transport(TransportCommand::SkipToQueueItem(
                QueueId(2)
            )))
        );
        assert_eq!(parse_line("").unwrap(), None);
    }

    #[test]
    fn test_parse_play_category_keeps_spaces() {
        let Some(ReplCommand::Transport(TransportCommand::PlayFromId { media_id, .. })) =
            parse_line("play album Kind of Blue").unwrap()
        else {
            panic!("expected PlayFromId");
        };
        assert_eq!(media_id.to_string(), "__BY_ALBUM__/Kind of Blue");
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("seek soon").is_err());
        assert!(parse_line("id a|b|c").is_err());
        assert!(parse_line("dance").is_err());
    }

    #[test]
    fn test_parse_focus_commands() {
        assert_eq!(
            parse_line("duck").unwrap(),
            Some(ReplCommand::OtherApp(OtherApp::Duck))
        );
        assert_eq!(parse_line("lock").unwrap(), Some(ReplCommand::Lock(true)));
    }
}
