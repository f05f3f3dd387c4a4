//! Booth - terminal two-deck DJ console

mod app;
mod console;
mod theme;
mod widgets;

use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use booth_audio::{shared, AutoMix, Band, DeckId, Engine, SharedEngine, EQ_RANGE_DB};
use booth_library::{scan_directory, Folders, TrackLoader, DEFAULT_FOLDER};

use app::App;
use console::Console;
use widgets::{
    CrossfaderWidget, DeckWidget, PadsWidget, PlaylistWidget, RhythmWidget, SpectrumWidget,
    StatusBarWidget,
};

/// Frame rate for UI updates
const FPS: u64 = 30;
/// Crossfader step for manual nudges
const FADER_NUDGE: f32 = 0.05;
/// EQ control-value step per keypress
const EQ_STEP: f32 = 0.1;
/// Pitch multiplier step per keypress
const PITCH_STEP: f32 = 0.05;

fn main() -> anyhow::Result<()> {
    init_logging();

    let music_dir = std::env::args().nth(1).map(PathBuf::from);

    // Probe the output device before building the engine so the graph runs
    // at the device rate
    let audio = audio_setup();
    let sample_rate = audio
        .as_ref()
        .map(|(_, config)| config.sample_rate().0)
        .unwrap_or(48000);

    let engine = shared(Engine::new(sample_rate));

    let mut startup_error = None;
    let _stream = match audio {
        Ok((device, config)) => match build_stream(&device, &config, engine.clone()) {
            Ok(stream) => {
                if let Err(e) = stream.play() {
                    startup_error = Some(format!("Failed to start audio: {e}"));
                    None
                } else {
                    Some(stream)
                }
            }
            Err(e) => {
                startup_error = Some(format!("Failed to create audio stream: {e}"));
                None
            }
        },
        Err(e) => {
            startup_error = Some(e.to_string());
            None
        }
    };
    if let Some(ref e) = startup_error {
        warn!(error = %e, "running without audio output");
    }

    let loader = TrackLoader::with_sample_rate(sample_rate);
    let mut console = Console::new(engine, loader);
    let mut folders = Folders::new();

    if let Some(ref dir) = music_dir {
        let tracks = scan_directory(dir);
        info!(count = tracks.len(), dir = %dir.display(), "library scanned");
        for track in &tracks {
            let _ = folders.add_track(DEFAULT_FOLDER, track.clone());
            console.playlist.push(track.clone());
        }
        console.set_pads(scan_directory(&dir.join("samples")));
    }

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut console, &mut folders, startup_error);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Best-effort file logging; a console app cannot log to the terminal
fn init_logging() {
    let log_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("booth");
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    if let Ok(file) = std::fs::File::create(log_dir.join("booth.log")) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .try_init();
    }
}

fn audio_setup() -> anyhow::Result<(cpal::Device, cpal::SupportedStreamConfig)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("No audio output device found")?;
    let config = device
        .default_output_config()
        .context("Failed to get audio config")?;
    Ok((device, config))
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::SupportedStreamConfig,
    engine: SharedEngine,
) -> anyhow::Result<cpal::Stream> {
    let channels = config.channels() as usize;

    // Pre-allocated stereo buffer for non-stereo devices (no allocation in
    // the audio callback)
    let mut stereo_buffer = vec![0.0f32; 16384];

    let stream = device.build_output_stream(
        &config.clone().into(),
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            // try_lock so the real-time thread never blocks; on contention
            // (rare), output silence
            if let Some(mut engine) = engine.try_lock() {
                if channels == 2 {
                    engine.process(data);
                } else {
                    fill_non_stereo(&mut engine, data, channels, &mut stereo_buffer);
                }
            } else {
                data.fill(0.0);
            }
        },
        |err| {
            warn!(%err, "audio stream error");
        },
        None,
    )?;

    Ok(stream)
}

/// Render through the stereo scratch buffer and spread onto a device with
/// some other channel count (mono downmix, extra channels silenced)
///
/// The scratch grows to fit the device buffer; after the first oversized
/// callback it never reallocates again.
fn fill_non_stereo(engine: &mut Engine, data: &mut [f32], channels: usize, scratch: &mut Vec<f32>) {
    let frames = data.len() / channels;
    if scratch.len() < frames * 2 {
        scratch.resize(frames * 2, 0.0);
    }
    let stereo = &mut scratch[..frames * 2];
    engine.process(stereo);
    for (i, frame) in data.chunks_mut(channels).enumerate() {
        let left = stereo[i * 2];
        let right = stereo[i * 2 + 1];
        if channels == 1 {
            frame[0] = (left + right) * 0.5;
        } else {
            frame[0] = left;
            frame[1] = right;
            for sample in &mut frame[2..] {
                *sample = 0.0;
            }
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    console: &mut Console,
    folders: &mut Folders,
    startup_error: Option<String>,
) -> anyhow::Result<()> {
    let mut app = App::new();
    let mut automix = AutoMix::default();

    match startup_error {
        Some(e) => app.set_error(e),
        None => app.set_message("Booth | space:play  m:auto-mix  enter:load  ?:see status bar"),
    }

    let frame_duration = Duration::from_millis(1000 / FPS);
    let mut last_frame = Instant::now();
    let mut last_tick = Instant::now();

    loop {
        if app.should_quit {
            break;
        }

        // Apply finished worker-thread loads
        for msg in console.poll() {
            app.set_message(msg);
        }

        // Coordinator tick
        if automix.is_enabled() && last_tick.elapsed() >= automix.config().tick_interval {
            console.tick_automix(&mut automix);
            last_tick = Instant::now();
        }

        // Pull one frame of engine state
        let snapshot = snapshot(console);
        app.push_rhythm(
            snapshot.freq_a.bass_energy().min(255.0) as u8,
            snapshot.freq_b.bass_energy().min(255.0) as u8,
        );
        app.spin_platters(
            snapshot.status_a.is_playing.then_some(snapshot.pitch_a),
            snapshot.status_b.is_playing.then_some(snapshot.pitch_b),
        );

        terminal.draw(|frame| render_ui(frame, &app, console, &automix, folders, &snapshot))?;

        // Input
        let timeout = frame_duration.saturating_sub(last_frame.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    app.should_quit = true;
                    continue;
                }
                handle_key(key.code, &mut app, console, &mut automix, folders);
            }
        }

        // Maintain frame rate
        let elapsed = last_frame.elapsed();
        if elapsed < frame_duration {
            thread::sleep(frame_duration - elapsed);
        }
        last_frame = Instant::now();
    }

    Ok(())
}

/// One frame's worth of engine state, read under a single lock
struct Snapshot {
    status_a: booth_audio::DeckStatus,
    status_b: booth_audio::DeckStatus,
    freq_a: booth_analysis::FrequencyData,
    freq_b: booth_analysis::FrequencyData,
    name_a: Option<String>,
    name_b: Option<String>,
    pitch_a: f32,
    pitch_b: f32,
    eq_a: [f32; 3],
    eq_b: [f32; 3],
    crossfader: f32,
    voices: usize,
}

fn snapshot(console: &Console) -> Snapshot {
    let engine = console.engine().lock();
    let eq = |deck| {
        [
            engine.eq_gain_db(deck, Band::Low),
            engine.eq_gain_db(deck, Band::Mid),
            engine.eq_gain_db(deck, Band::High),
        ]
    };
    Snapshot {
        status_a: engine.deck_status(DeckId::A),
        status_b: engine.deck_status(DeckId::B),
        freq_a: engine.frequency_data(DeckId::A),
        freq_b: engine.frequency_data(DeckId::B),
        name_a: engine.track_name(DeckId::A),
        name_b: engine.track_name(DeckId::B),
        pitch_a: engine.pitch(DeckId::A),
        pitch_b: engine.pitch(DeckId::B),
        eq_a: eq(DeckId::A),
        eq_b: eq(DeckId::B),
        crossfader: engine.crossfader(),
        voices: engine.one_shot_voices(),
    }
}

fn handle_key(
    code: KeyCode,
    app: &mut App,
    console: &mut Console,
    automix: &mut AutoMix,
    folders: &mut Folders,
) {
    match code {
        KeyCode::Char('q') => app.should_quit = true,

        // Focus
        KeyCode::Tab => app.focused = app.focused.other(),
        KeyCode::Char('a') => app.focused = DeckId::A,
        KeyCode::Char('b') => app.focused = DeckId::B,

        // Transport
        KeyCode::Char(' ') => {
            if let Some(msg) = console.toggle_play(app.focused) {
                app.set_warning(msg);
            }
        }

        // Crossfader
        KeyCode::Left => nudge_crossfader(console, -FADER_NUDGE),
        KeyCode::Right => nudge_crossfader(console, FADER_NUDGE),

        // Auto-mix
        KeyCode::Char('m') => {
            let enable = !automix.is_enabled();
            if enable {
                // Enabling counts as the user gesture that unblocks playback
                console.engine().lock().activate();
            }
            automix.set_enabled(enable);
            app.set_message(if enable { "Auto-mix ON" } else { "Auto-mix OFF" });
        }

        // EQ on the focused deck
        KeyCode::Char('u') => adjust_eq(console, app.focused, Band::Low, EQ_STEP),
        KeyCode::Char('j') => adjust_eq(console, app.focused, Band::Low, -EQ_STEP),
        KeyCode::Char('i') => adjust_eq(console, app.focused, Band::Mid, EQ_STEP),
        KeyCode::Char('k') => adjust_eq(console, app.focused, Band::Mid, -EQ_STEP),
        KeyCode::Char('o') => adjust_eq(console, app.focused, Band::High, EQ_STEP),
        KeyCode::Char('l') => adjust_eq(console, app.focused, Band::High, -EQ_STEP),

        // Pitch on the focused deck
        KeyCode::Char('[') => adjust_pitch(console, app.focused, -PITCH_STEP),
        KeyCode::Char(']') => adjust_pitch(console, app.focused, PITCH_STEP),

        // Sampler pads
        KeyCode::Char(c @ '1'..='9') => {
            console.engine().lock().activate();
            let index = c as usize - '1' as usize;
            if let Some(msg) = console.trigger_pad(index) {
                app.set_message(msg);
            }
        }

        // Queue navigation and loading
        KeyCode::Down => app.select_next(console.playlist.len()),
        KeyCode::Up => app.select_prev(),
        KeyCode::Enter => {
            console.engine().lock().activate();
            match console.request_load(app.focused, app.selected, true) {
                Some(name) => app.set_message(format!("Loading {name}...")),
                None => app.set_warning("Nothing selected"),
            }
        }

        // Folder selection: cycling rebuilds the queue from that folder
        KeyCode::Char('f') => {
            let names: Vec<String> = folders.names().iter().map(|n| n.to_string()).collect();
            if !names.is_empty() {
                app.folder_index = (app.folder_index + 1) % names.len();
                let name = &names[app.folder_index];
                console.playlist.clear();
                if let Some(tracks) = folders.tracks(name) {
                    for track in tracks {
                        console.playlist.push(track.clone());
                    }
                }
                app.selected = 0;
                app.set_message(format!("Folder: {name}"));
            }
        }

        KeyCode::Char('t') => app.toggle_theme(),

        _ => {}
    }
}

fn nudge_crossfader(console: &mut Console, delta: f32) {
    let mut engine = console.engine().lock();
    let position = engine.crossfader();
    engine.set_crossfader(position + delta);
}

fn adjust_eq(console: &mut Console, deck: DeckId, band: Band, delta: f32) {
    let mut engine = console.engine().lock();
    let value = engine.eq_gain_db(deck, band) / EQ_RANGE_DB + delta;
    engine.set_eq(deck, band, value);
}

fn adjust_pitch(console: &mut Console, deck: DeckId, delta: f32) {
    let mut engine = console.engine().lock();
    let rate = engine.pitch(deck) + delta;
    engine.set_pitch(deck, rate);
}

fn render_ui(
    frame: &mut ratatui::Frame,
    app: &App,
    console: &Console,
    automix: &AutoMix,
    folders: &Folders,
    snapshot: &Snapshot,
) {
    let area = frame.area();
    let theme = &app.theme;

    let background = ratatui::widgets::Block::default().style(theme.normal());
    frame.render_widget(background, area);

    let chunks = Layout::vertical([
        Constraint::Length(7), // Decks
        Constraint::Min(6),    // Queue
        Constraint::Length(6), // Spectrum
        Constraint::Length(4), // Rhythm
        Constraint::Length(3), // Pads
        Constraint::Length(4), // Crossfader
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    let deck_chunks =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);

    let deck_a = DeckWidget::new(DeckId::A, snapshot.status_a, theme)
        .track_name(snapshot.name_a.clone())
        .pitch(snapshot.pitch_a)
        .eq_db(snapshot.eq_a[0], snapshot.eq_a[1], snapshot.eq_a[2])
        .platter_phase(app.platter_phase(DeckId::A))
        .focused(app.focused == DeckId::A);
    frame.render_widget(deck_a, deck_chunks[0]);

    let deck_b = DeckWidget::new(DeckId::B, snapshot.status_b, theme)
        .track_name(snapshot.name_b.clone())
        .pitch(snapshot.pitch_b)
        .eq_db(snapshot.eq_b[0], snapshot.eq_b[1], snapshot.eq_b[2])
        .platter_phase(app.platter_phase(DeckId::B))
        .focused(app.focused == DeckId::B);
    frame.render_widget(deck_b, deck_chunks[1]);

    let folder_name = folders
        .names()
        .get(app.folder_index)
        .copied()
        .unwrap_or(booth_library::DEFAULT_FOLDER);
    frame.render_widget(
        PlaylistWidget::new(console.playlist.tracks(), app.selected, folder_name, theme),
        chunks[1],
    );

    frame.render_widget(
        SpectrumWidget::new(&snapshot.freq_a, &snapshot.freq_b, theme),
        chunks[2],
    );
    frame.render_widget(
        RhythmWidget::new(&app.rhythm_a, &app.rhythm_b, theme),
        chunks[3],
    );
    frame.render_widget(
        PadsWidget::new(console.pads(), snapshot.voices, theme),
        chunks[4],
    );
    frame.render_widget(
        CrossfaderWidget::new(snapshot.crossfader, theme).automix(automix.is_enabled()),
        chunks[5],
    );
    frame.render_widget(StatusBarWidget::new(app.message.as_ref(), theme), chunks[6]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_stereo_fill_grows_scratch_for_large_buffers() {
        let mut engine = Engine::new(48000);
        let mut scratch = vec![0.0f32; 64];
        // A mono device asking for more frames than the scratch holds
        let mut data = vec![1.0f32; 12_000];

        fill_non_stereo(&mut engine, &mut data, 1, &mut scratch);

        assert!(scratch.len() >= 24_000);
        assert!(data.iter().all(|&s| s == 0.0), "idle engine renders silence");
    }

    #[test]
    fn non_stereo_fill_silences_extra_channels() {
        let mut engine = Engine::new(48000);
        let mut scratch = vec![0.0f32; 16384];
        let mut data = vec![1.0f32; 6 * 128];

        fill_non_stereo(&mut engine, &mut data, 6, &mut scratch);

        for frame in data.chunks(6) {
            assert!(frame[2..].iter().all(|&s| s == 0.0));
        }
    }
}
