use std::sync::mpsc::{self, Sender};
use std::time::{Duration, Instant};

use super::*;
use crate::audio::testing::{CallLog, PlayReply, RecordingSession, SessionCall, take_calls};
use crate::audio::{SessionEvent, SessionEventKind};
use crate::catalog::Track;
use crate::config::PlayerSettings;

struct Rig {
    player: PlaybackController<RecordingSession>,
    log: CallLog,
    events: Sender<SessionEvent>,
}

impl Rig {
    fn new(reply: PlayReply) -> Self {
        let (tx, rx) = mpsc::channel();
        let session = RecordingSession::new(tx.clone(), reply);
        let log = session.log();
        let player = PlaybackController::new(session, rx, &PlayerSettings::default());
        take_calls(&log);
        Self {
            player,
            log,
            events: tx,
        }
    }

    /// Inject an event for the current binding and apply it.
    fn emit(&mut self, kind: SessionEventKind) {
        let generation = self.player.generation();
        self.events.send(SessionEvent::new(generation, kind)).unwrap();
        self.player.pump_events();
    }

    fn calls(&self) -> Vec<SessionCall> {
        take_calls(&self.log)
    }

    fn state(&self) -> &PlaybackState {
        self.player.state()
    }
}

fn track(id: u64) -> Track {
    Track::fixture(id, Some(&format!("/media/{id}.mp3")), None)
}

fn bind(id: u64, generation: u64) -> SessionCall {
    SessionCall::Bind(format!("/media/{id}.mp3"), generation)
}

#[test]
fn new_controller_is_idle_at_default_volume() {
    let (tx, rx) = mpsc::channel();
    let session = RecordingSession::new(tx, PlayReply::Start);
    let log = session.log();
    let player = PlaybackController::new(session, rx, &PlayerSettings::default());

    let s = player.state();
    assert_eq!(s.status, PlayerStatus::Idle);
    assert!(s.current_track.is_none());
    assert!(!s.is_playing);
    assert_eq!(s.volume, 0.7);
    assert_eq!(take_calls(&log), vec![SessionCall::SetGain(0.7)]);
}

#[test]
fn play_track_loads_primary_source_then_confirms_on_start() {
    let mut rig = Rig::new(PlayReply::Start);
    let a = Track::fixture(1, Some("/media/1.mp3"), Some("/media/1-preview.mp3"));

    rig.player.play_track(&a);
    assert_eq!(rig.state().status, PlayerStatus::Loading);
    assert!(rig.state().is_playing);
    assert_eq!(rig.state().current_track.as_ref(), Some(&a));
    assert_eq!(
        rig.calls(),
        vec![
            SessionCall::Stop,
            SessionCall::SetPosition(0.0),
            bind(1, 1),
            SessionCall::Play,
        ]
    );

    rig.player.pump_events();
    assert_eq!(rig.state().status, PlayerStatus::Playing);
    assert!(rig.state().is_playing);
}

#[test]
fn play_track_uses_preview_only_when_primary_is_missing() {
    let mut rig = Rig::new(PlayReply::Start);
    let t = Track::fixture(5, None, Some("/media/5-preview.mp3"));

    rig.player.play_track(&t);
    assert!(
        rig.calls()
            .contains(&SessionCall::Bind("/media/5-preview.mp3".into(), 1))
    );
}

#[test]
fn play_track_without_any_source_changes_nothing() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(1));
    rig.player.pump_events();
    rig.emit(SessionEventKind::TimeAdvanced { position: 12.0 });
    rig.calls();

    let before = rig.state().clone();
    rig.player.play_track(&Track::fixture(9, None, None));
    rig.player.play_track(&Track::fixture(10, Some(""), Some("")));

    assert_eq!(rig.state(), &before);
    assert!(rig.calls().is_empty());
}

#[test]
fn play_track_on_current_track_toggles_without_reloading() {
    let mut rig = Rig::new(PlayReply::Start);
    let a = track(1);
    rig.player.play_track(&a);
    rig.player.pump_events();
    rig.emit(SessionEventKind::MetadataReady { duration: 200.0 });
    rig.emit(SessionEventKind::TimeAdvanced { position: 42.0 });
    rig.calls();

    rig.player.play_track(&a);
    assert!(!rig.state().is_playing);
    assert_eq!(rig.state().status, PlayerStatus::Paused);
    assert_eq!(rig.calls(), vec![SessionCall::Pause]);

    rig.player.play_track(&a);
    assert!(rig.state().is_playing);
    assert_eq!(rig.calls(), vec![SessionCall::Play]);
    rig.player.pump_events();
    assert_eq!(rig.state().status, PlayerStatus::Playing);
    assert_eq!(rig.state().current_time, 42.0);
    assert_eq!(rig.state().duration, 200.0);
}

#[test]
fn switching_tracks_tears_down_before_starting() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(1));
    rig.player.pump_events();
    rig.calls();

    rig.player.play_track(&track(2));
    let calls = rig.calls();
    assert_eq!(
        calls,
        vec![
            SessionCall::Stop,
            SessionCall::SetPosition(0.0),
            bind(2, 2),
            SessionCall::Play,
        ]
    );
    assert_eq!(rig.state().current_track.as_ref().map(|t| t.id.0), Some(2));
}

#[test]
fn every_bind_is_preceded_by_stop_and_rewind() {
    let mut rig = Rig::new(PlayReply::Start);
    for id in [1, 2, 3, 1, 4, 2] {
        rig.player.play_track(&track(id));
        rig.player.pump_events();
    }

    let calls = rig.calls();
    let mut binds = 0;
    for (i, call) in calls.iter().enumerate() {
        if let SessionCall::Bind(..) = call {
            binds += 1;
            assert!(i >= 2);
            assert_eq!(calls[i - 2], SessionCall::Stop);
            assert_eq!(calls[i - 1], SessionCall::SetPosition(0.0));
            assert_eq!(calls.get(i + 1), Some(&SessionCall::Play));
        }
    }
    assert_eq!(binds, 6);
    assert_eq!(rig.state().status, PlayerStatus::Playing);
    assert_eq!(rig.state().current_track.as_ref().map(|t| t.id.0), Some(2));
}

#[test]
fn events_from_a_replaced_binding_are_ignored() {
    let mut rig = Rig::new(PlayReply::Silent);
    rig.player.play_track(&track(1));
    rig.player.play_track(&track(2));

    rig.events
        .send(SessionEvent::new(1, SessionEventKind::Failed("late".into())))
        .unwrap();
    rig.events
        .send(SessionEvent::new(1, SessionEventKind::MetadataReady { duration: 99.0 }))
        .unwrap();
    rig.player.pump_events();
    assert_eq!(rig.state().status, PlayerStatus::Loading);
    assert_eq!(rig.state().duration, 0.0);

    rig.emit(SessionEventKind::Started);
    assert_eq!(rig.state().status, PlayerStatus::Playing);
}

#[test]
fn rejected_start_fails_the_new_track_without_rollback() {
    let mut rig = Rig::new(PlayReply::Silent);
    rig.player.play_track(&track(1));
    rig.emit(SessionEventKind::Started);

    rig.player.play_track(&track(2));
    rig.emit(SessionEventKind::Rejected("autoplay blocked".into()));

    let s = rig.state();
    assert_eq!(s.status, PlayerStatus::Failed);
    assert!(!s.is_playing);
    assert_eq!(s.current_track.as_ref().map(|t| t.id.0), Some(2));
}

#[test]
fn decode_failure_is_terminal_and_not_retried() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(1));
    rig.player.pump_events();
    rig.calls();

    rig.emit(SessionEventKind::Failed("unsupported format".into()));
    let s = rig.state();
    assert_eq!(s.status, PlayerStatus::Failed);
    assert!(!s.is_playing);
    assert!(s.current_track.is_some());
    assert!(rig.calls().is_empty());
}

#[test]
fn pause_and_resume_are_noops_without_a_track() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.pause_track();
    rig.player.resume_track();
    rig.player.toggle_play_pause();

    assert!(rig.calls().is_empty());
    assert!(!rig.state().is_playing);
    assert_eq!(rig.state().status, PlayerStatus::Idle);
}

#[test]
fn pause_is_idempotent() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(1));
    rig.player.pump_events();

    rig.player.pause_track();
    rig.player.pause_track();
    assert!(!rig.state().is_playing);
    assert_eq!(rig.state().status, PlayerStatus::Paused);
}

#[test]
fn rejected_resume_leaves_player_paused() {
    let mut rig = Rig::new(PlayReply::Silent);
    rig.player.play_track(&track(1));
    rig.emit(SessionEventKind::Started);
    rig.player.pause_track();

    rig.player.resume_track();
    assert!(rig.state().is_playing);
    rig.emit(SessionEventKind::Rejected("no user gesture".into()));

    assert!(!rig.state().is_playing);
    assert_eq!(rig.state().status, PlayerStatus::Paused);
}

#[test]
fn start_arriving_after_pause_is_paused_again() {
    let mut rig = Rig::new(PlayReply::Silent);
    rig.player.play_track(&track(1));
    rig.player.pause_track();
    rig.calls();

    rig.emit(SessionEventKind::Started);
    assert_eq!(rig.state().status, PlayerStatus::Paused);
    assert!(!rig.state().is_playing);
    assert_eq!(rig.calls(), vec![SessionCall::Pause]);
}

#[test]
fn toggle_play_pause_follows_intent() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(1));
    rig.player.pump_events();

    rig.player.toggle_play_pause();
    assert!(!rig.state().is_playing);
    rig.player.toggle_play_pause();
    assert!(rig.state().is_playing);
}

#[test]
fn volume_is_clamped_into_unit_range() {
    let mut rig = Rig::new(PlayReply::Start);

    rig.player.set_volume(-5.0);
    assert_eq!(rig.state().volume, 0.0);
    rig.player.set_volume(1.5);
    assert_eq!(rig.state().volume, 1.0);
    rig.player.set_volume(0.42);
    assert_eq!(rig.state().volume, 0.42);
    rig.player.set_volume(f64::NAN);
    assert_eq!(rig.state().volume, 0.42);

    assert_eq!(
        rig.calls(),
        vec![
            SessionCall::SetGain(0.0),
            SessionCall::SetGain(1.0),
            SessionCall::SetGain(0.42),
        ]
    );
}

#[test]
fn toggle_mute_restores_default_volume() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.set_volume(0.3);

    rig.player.toggle_mute();
    assert_eq!(rig.state().volume, 0.0);
    rig.player.toggle_mute();
    assert_eq!(rig.state().volume, 0.7);
}

fn rig_with_playlist(current: u64) -> Rig {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.set_playlist(vec![track(1), track(2), track(3)]);
    rig.player.play_track(&track(current));
    rig.player.pump_events();
    rig.calls();
    rig
}

#[test]
fn next_track_plays_the_following_entry() {
    let mut rig = rig_with_playlist(2);
    rig.player.next_track();
    assert_eq!(rig.state().current_track.as_ref().map(|t| t.id.0), Some(3));
    assert!(rig.calls().contains(&bind(3, 2)));
}

#[test]
fn next_track_on_last_entry_is_a_noop() {
    let mut rig = rig_with_playlist(3);
    let before = rig.state().clone();
    rig.player.next_track();
    assert_eq!(rig.state(), &before);
    assert!(rig.calls().is_empty());
}

#[test]
fn next_track_without_current_or_playlist_is_a_noop() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.set_playlist(vec![track(1), track(2)]);
    rig.player.next_track();
    assert!(rig.state().current_track.is_none());

    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(1));
    rig.calls();
    rig.player.next_track();
    assert!(rig.calls().is_empty());
}

#[test]
fn next_track_from_outside_the_playlist_starts_at_the_top() {
    let mut rig = rig_with_playlist(2);
    rig.player.play_track(&track(9));
    rig.player.pump_events();

    rig.player.next_track();
    assert_eq!(rig.state().current_track.as_ref().map(|t| t.id.0), Some(1));
}

#[test]
fn previous_track_plays_the_preceding_entry() {
    let mut rig = rig_with_playlist(2);
    rig.player.previous_track();
    assert_eq!(rig.state().current_track.as_ref().map(|t| t.id.0), Some(1));
}

#[test]
fn previous_track_on_first_entry_restarts_it() {
    let mut rig = rig_with_playlist(1);
    rig.emit(SessionEventKind::MetadataReady { duration: 180.0 });
    rig.emit(SessionEventKind::TimeAdvanced { position: 30.0 });

    rig.player.previous_track();
    let s = rig.state();
    assert_eq!(s.current_track.as_ref().map(|t| t.id.0), Some(1));
    assert_eq!(s.current_time, 0.0);
    assert_eq!(rig.calls(), vec![SessionCall::SetPosition(0.0)]);
}

#[test]
fn skip_to_end_stops_one_second_short() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(1));
    rig.player.pump_events();
    rig.emit(SessionEventKind::MetadataReady { duration: 200.0 });
    rig.calls();

    rig.player.skip_to_end();
    assert_eq!(rig.state().current_time, 199.0);
    assert_eq!(rig.calls(), vec![SessionCall::SetPosition(199.0)]);

    rig.player.skip_to_start();
    assert_eq!(rig.state().current_time, 0.0);
}

#[test]
fn skip_forward_needs_a_known_duration_and_clamps_to_it() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(1));
    rig.player.pump_events();
    rig.calls();

    rig.player.skip_forward(10.0);
    assert!(rig.calls().is_empty());
    assert_eq!(rig.state().current_time, 0.0);

    rig.emit(SessionEventKind::MetadataReady { duration: 100.0 });
    rig.emit(SessionEventKind::TimeAdvanced { position: 95.0 });
    rig.player.skip_forward(10.0);
    assert_eq!(rig.state().current_time, 100.0);

    rig.emit(SessionEventKind::TimeAdvanced { position: 40.0 });
    rig.player.skip_forward(10.0);
    assert_eq!(rig.state().current_time, 50.0);
}

#[test]
fn skip_backward_clamps_to_zero() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(1));
    rig.player.pump_events();
    rig.emit(SessionEventKind::TimeAdvanced { position: 25.0 });

    rig.player.skip_backward(10.0);
    assert_eq!(rig.state().current_time, 15.0);
    rig.player.skip_backward(10.0);
    rig.player.skip_backward(10.0);
    assert_eq!(rig.state().current_time, 0.0);
}

#[test]
fn seek_to_is_optimistic_and_clamped() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(1));
    rig.player.pump_events();

    rig.player.seek_to(500.0);
    assert_eq!(rig.state().current_time, 500.0);

    rig.emit(SessionEventKind::MetadataReady { duration: 200.0 });
    rig.player.seek_to(500.0);
    assert_eq!(rig.state().current_time, 200.0);
    rig.player.seek_to(-3.0);
    assert_eq!(rig.state().current_time, 0.0);

    rig.player.seek_to(60.0);
    rig.emit(SessionEventKind::TimeAdvanced { position: 60.5 });
    assert_eq!(rig.state().current_time, 60.5);
}

#[test]
fn non_finite_seek_is_ignored() {
    let mut rig = Rig::new(PlayReply::Silent);
    rig.player.play_track(&track(1));
    rig.emit(SessionEventKind::TimeAdvanced { position: 4.0 });
    rig.calls();

    let before = rig.state().clone();
    rig.player.seek_to(f64::INFINITY);
    rig.player.seek_to(f64::NEG_INFINITY);
    rig.player.seek_to(f64::NAN);
    assert!(rig.player.dispatch(PlayerCmd::SeekTo(f64::INFINITY)));

    assert_eq!(rig.state(), &before);
    assert!(rig.calls().is_empty());
}

#[test]
fn seek_to_fraction_maps_onto_duration() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(1));
    rig.player.pump_events();
    rig.calls();

    rig.player.seek_to_fraction(0.5);
    assert!(rig.calls().is_empty());

    rig.emit(SessionEventKind::MetadataReady { duration: 200.0 });
    rig.player.seek_to_fraction(0.25);
    assert_eq!(rig.state().current_time, 50.0);
    rig.player.seek_to_fraction(3.0);
    assert_eq!(rig.state().current_time, 200.0);
}

#[test]
fn ended_track_stops_and_resume_restarts_from_zero() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(1));
    rig.player.pump_events();
    rig.emit(SessionEventKind::MetadataReady { duration: 30.0 });
    rig.emit(SessionEventKind::Ended);

    assert_eq!(rig.state().status, PlayerStatus::Ended);
    assert!(!rig.state().is_playing);
    assert_eq!(rig.state().current_time, 30.0);
    rig.calls();

    rig.player.resume_track();
    assert_eq!(
        rig.calls(),
        vec![SessionCall::SetPosition(0.0), SessionCall::Play]
    );
    rig.player.pump_events();
    assert_eq!(rig.state().status, PlayerStatus::Playing);
    assert_eq!(rig.state().current_time, 0.0);
}

#[test]
fn seek_after_end_is_kept_on_resume() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(1));
    rig.player.pump_events();
    rig.emit(SessionEventKind::MetadataReady { duration: 100.0 });
    rig.emit(SessionEventKind::Ended);
    rig.calls();

    rig.player.seek_to_fraction(0.5);
    assert_eq!(rig.state().status, PlayerStatus::Paused);
    rig.player.toggle_play_pause();

    assert_eq!(
        rig.calls(),
        vec![SessionCall::SetPosition(50.0), SessionCall::Play]
    );
    rig.player.pump_events();
    assert_eq!(rig.state().status, PlayerStatus::Playing);
    assert_eq!(rig.state().current_time, 50.0);
}

#[test]
fn set_playlist_leaves_playback_alone() {
    let mut rig = Rig::new(PlayReply::Start);
    rig.player.play_track(&track(7));
    rig.player.pump_events();
    rig.calls();

    rig.player.set_playlist(vec![track(1), track(2)]);
    assert_eq!(rig.state().playlist.len(), 2);
    assert_eq!(rig.state().current_track.as_ref().map(|t| t.id.0), Some(7));
    assert!(rig.state().is_playing);
    assert!(rig.calls().is_empty());
}

#[test]
fn state_queries_for_subscribers() {
    let mut rig = Rig::new(PlayReply::Start);
    assert_eq!(rig.state().progress(), 0.0);

    rig.player.play_track(&track(1));
    rig.player.pump_events();
    rig.emit(SessionEventKind::MetadataReady { duration: 200.0 });
    rig.emit(SessionEventKind::TimeAdvanced { position: 50.0 });

    let s = rig.state();
    assert_eq!(s.progress(), 0.25);
    assert!(s.is_current_and_playing(track(1).id));
    assert!(!s.is_current_and_playing(track(2).id));

    rig.player.pause_track();
    assert!(rig.state().is_current(track(1).id));
    assert!(!rig.state().is_current_and_playing(track(1).id));
}

#[test]
fn dispatch_routes_commands_and_quit_releases() {
    let mut rig = Rig::new(PlayReply::Start);
    assert!(rig.player.dispatch(PlayerCmd::SetPlaylist(vec![track(1), track(2)])));
    assert!(rig.player.dispatch(PlayerCmd::PlayTrack(track(1))));
    rig.player.pump_events();
    assert!(rig.player.dispatch(PlayerCmd::Next));
    assert!(rig.player.dispatch(PlayerCmd::SetVolume(2.0)));
    assert_eq!(rig.state().volume, 1.0);
    assert_eq!(rig.state().current_track.as_ref().map(|t| t.id.0), Some(2));
    rig.calls();

    assert!(!rig.player.dispatch(PlayerCmd::Quit));
    assert_eq!(rig.calls(), vec![SessionCall::Release]);
    assert!(!rig.state().is_playing);
}

#[test]
fn service_publishes_state_and_releases_on_shutdown() {
    let log = CallLog::default();
    let session_log = log.clone();
    let service = PlayerService::spawn(&PlayerSettings::default(), move |events| {
        RecordingSession::with_log(events, PlayReply::Start, session_log)
    });

    service
        .send(PlayerCmd::SetPlaylist(vec![track(1), track(2)]))
        .unwrap();
    service.send(PlayerCmd::PlayTrack(track(2))).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let handle = service.state_handle();
    loop {
        let playing = handle
            .lock()
            .map(|s| s.status == PlayerStatus::Playing)
            .unwrap_or(false);
        if playing {
            break;
        }
        assert!(Instant::now() < deadline, "service never reported Playing");
        std::thread::sleep(Duration::from_millis(5));
    }

    let snapshot = service.snapshot();
    assert_eq!(snapshot.playlist.len(), 2);
    assert_eq!(snapshot.current_track.as_ref().map(|t| t.id.0), Some(2));

    service.shutdown();
    assert_eq!(log.lock().unwrap().last(), Some(&SessionCall::Release));
    assert!(!service.snapshot().is_playing);
}
