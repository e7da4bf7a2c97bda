//! The interactive console.
//!
//! Console lines are either local verbs (see [`crate::validation`]) or
//! protocol commands. Between lines the protocol keeps ticking so peer
//! messages and connection changes are picked up while the user is idle.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use netchess_engine::coord::Coordinate;
use netchess_engine::logger::MatchLogger;
use netchess_engine::pieces::Side;
use netchess_engine::rules::MoveRequest;
use netchess_engine::selection::Selection;
use netchess_net::{
    init_logging_with, CommandProtocol, LogFormat, Phase, Presenter, TcpTransport, TickInput,
    Transport,
};

use crate::config::Config;
use crate::error::CliError;
use crate::io_utils::{read_script, read_stdin_line};
use crate::ui;
use crate::validation::{parse_console_line, ConsoleInput, HELP};

const TICK: Duration = Duration::from_millis(50);

/// Asks for a redraw whenever the board or the phase changes.
#[derive(Debug, Default)]
pub struct ConsolePresenter {
    redraw: bool,
}

impl ConsolePresenter {
    fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }
}

impl Presenter for ConsolePresenter {
    fn turn_changed(&mut self, _side_to_move: Side, _turn: u32) {
        self.redraw = true;
    }

    fn phase_changed(&mut self, _phase: Phase) {
        self.redraw = true;
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// One console driving one protocol instance.
pub struct ConsoleSession<T: Transport> {
    protocol: CommandProtocol<T, ConsolePresenter>,
    selection: Selection,
    auto_promote: bool,
    recorder: Option<MatchLogger>,
    recorded: bool,
}

impl<T: Transport> ConsoleSession<T> {
    pub fn new(config: &Config, transport: T, recorder: Option<MatchLogger>) -> Self {
        let mut protocol =
            CommandProtocol::new(config.session_config(), transport, ConsolePresenter::default());
        if let Some(name) = &config.name {
            protocol = protocol.with_local_name(name.clone());
        }
        Self {
            protocol,
            selection: Selection::new(),
            auto_promote: config.auto_promote,
            recorder,
            recorded: false,
        }
    }

    pub fn protocol(&self) -> &CommandProtocol<T, ConsolePresenter> {
        &self.protocol
    }

    pub fn protocol_mut(&mut self) -> &mut CommandProtocol<T, ConsolePresenter> {
        &mut self.protocol
    }

    pub fn handle_line(
        &mut self,
        line: &str,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<Flow, CliError> {
        match parse_console_line(line) {
            ConsoleInput::Quit => return Ok(Flow::Quit),
            ConsoleInput::Empty => self.tick(TickInput::default(), out)?,
            ConsoleInput::Board => write!(out, "{}", self.protocol.status_report())?,
            ConsoleInput::Help => write!(out, "{}", HELP)?,
            ConsoleInput::Invalid(msg) => ui::write_error(err, &msg)?,
            ConsoleInput::Click(at) => match self.click(at) {
                Some(request) => self.tick(TickInput::selection(request), out)?,
                None => {
                    if let Some(selected) = self.selection.selected() {
                        writeln!(out, "Selected {}", selected)?;
                    }
                }
            },
            ConsoleInput::Protocol(command) => self.tick(TickInput::console(command), out)?,
        }
        Ok(Flow::Continue)
    }

    /// Run one protocol tick and show what changed.
    pub fn tick(&mut self, input: TickInput, out: &mut dyn Write) -> Result<(), CliError> {
        self.protocol.tick(input);
        if self.protocol.presenter_mut().take_redraw()
            && let Some(game) = self.protocol.game()
        {
            write!(out, "{}", game.board().render())?;
        }
        self.record_finished_match()
    }

    /// Leave the console, telling the peer if needed.
    pub fn finish(&mut self) -> Result<(), CliError> {
        self.protocol.quit();
        self.record_finished_match()
    }

    fn click(&mut self, at: Coordinate) -> Option<MoveRequest> {
        let game = self.protocol.game()?;
        // one console plays both sides until a peer is attached
        let controls = self
            .protocol
            .transport()
            .state()
            .has_peer()
            .then(|| self.protocol.session().local_side());
        let mut request = self.selection.click(game, at, controls)?;
        request.auto_promote = self.auto_promote;
        Some(request)
    }

    fn record_finished_match(&mut self) -> Result<(), CliError> {
        let Some(game) = self.protocol.game() else {
            return Ok(());
        };
        if game.is_in_progress() {
            self.recorded = false;
            return Ok(());
        }
        if self.recorded {
            return Ok(());
        }
        self.recorded = true;
        let Some(logger) = self.recorder.as_mut() else {
            return Ok(());
        };
        if let Some(record) = self.protocol.match_record(logger.next_id()) {
            logger.write(&record)?;
            tracing::info!(match_id = %record.match_id, moves = record.moves.len(), "Match recorded");
        }
        Ok(())
    }

    /// Feed console lines until `quit`, end of input or an interrupt.
    pub fn run(
        &mut self,
        lines: &Receiver<String>,
        interrupted: &AtomicBool,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<(), CliError> {
        loop {
            if interrupted.load(Ordering::SeqCst) {
                return Err(CliError::Interrupted("Ctrl+C".into()));
            }
            match lines.recv_timeout(TICK) {
                Ok(line) => {
                    if self.handle_line(&line, out, err)? == Flow::Quit {
                        return Ok(());
                    }
                }
                Err(RecvTimeoutError::Timeout) => self.tick(TickInput::default(), out)?,
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
    }
}

pub fn handle_play_command(
    config: Config,
    script: Option<PathBuf>,
    record: Option<PathBuf>,
    log_format: LogFormat,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    init_logging_with(log_format);

    let lines = match script {
        Some(path) => {
            let script = read_script(&path)?;
            if script.is_empty() {
                ui::display_warning(err, &format!("{} has no commands", path.display()))?;
            }
            scripted(script)
        }
        None => spawn_stdin_reader(),
    };
    let recorder = record.map(MatchLogger::create).transpose()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&interrupted);
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                flag.store(true, Ordering::SeqCst);
            }
        });
    }

    let transport = TcpTransport::new(runtime.handle().clone());
    let mut session = ConsoleSession::new(&config, transport, recorder);
    writeln!(out, "netchess console, type 'help' for commands")?;

    let result = session.run(&lines, &interrupted, out, err);
    let finished = session.finish();
    drop(session);
    runtime.shutdown_timeout(Duration::from_millis(200));
    result.and(finished)
}

fn scripted(lines: Vec<String>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    for line in lines {
        // the receiver is still in scope, so this cannot fail
        let _ = tx.send(line);
    }
    rx
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut handle = stdin.lock();
        while let Some(line) = read_stdin_line(&mut handle) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
