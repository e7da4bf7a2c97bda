//! The command dispatcher that keeps two consoles playing the same match.
//!
//! [`CommandProtocol`] owns the session state, the match and the transport.
//! Commands arrive from three places: the local console, the peer
//! (`remote=true`) and, on a spectator, the server's relay
//! (`fromServer=true`). Each one is parsed into a [`Command`], checked against
//! the seat and connection state, applied, and then passed on: local commands
//! go to the peer, peer commands go to the spectators, relays go nowhere.

use std::net::IpAddr;

use netchess_engine::errors::RuleViolation;
use netchess_engine::game::{EndCause, MatchController, MatchEvent, MatchResult};
use netchess_engine::logger::MatchRecord;
use netchess_engine::pieces::Side;
use netchess_engine::rules::MoveRequest;

use crate::command::{ArgumentError, Command, Envelope, MoveArgs, Origin, Setting, Snapshot};
use crate::config::SessionConfig;
use crate::errors::{Discrepancy, ProtocolError};
use crate::presenter::{Presenter, SoundCue};
use crate::session::{Link, Phase, SessionState, Transition};
use crate::transport::Transport;

pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
pub const QUITTING_MATCH: &str = "quitting_match";

/// Everything the front end gathered since the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Console lines, in the order they were typed.
    pub console: Vec<String>,
    /// A move staged by board selection.
    pub selection: Option<MoveRequest>,
}

impl TickInput {
    pub fn console(line: impl Into<String>) -> Self {
        Self {
            console: vec![line.into()],
            selection: None,
        }
    }

    pub fn selection(request: MoveRequest) -> Self {
        Self {
            console: Vec::new(),
            selection: Some(request),
        }
    }
}

pub struct CommandProtocol<T: Transport, P: Presenter> {
    config: SessionConfig,
    transport: T,
    presenter: P,
    session: SessionState,
    game: Option<MatchController>,
    /// Display names indexed by side.
    names: [String; 2],
    /// Name to claim once this console knows which side it plays.
    local_name: Option<String>,
    /// The side with an open draw offer.
    draw_offer: Option<Side>,
    peer_attached: bool,
    /// Spectators seen at the last link check.
    spectators: usize,
    ended_this_tick: bool,
}

impl<T: Transport, P: Presenter> CommandProtocol<T, P> {
    pub fn new(config: SessionConfig, transport: T, presenter: P) -> Self {
        let names = config.player_names.clone();
        Self {
            config,
            transport,
            presenter,
            session: SessionState::default(),
            game: None,
            names,
            local_name: None,
            draw_offer: None,
            peer_attached: false,
            spectators: 0,
            ended_this_tick: false,
        }
    }

    pub fn with_local_name(mut self, name: impl Into<String>) -> Self {
        self.local_name = Some(name.into());
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn game(&self) -> Option<&MatchController> {
        self.game.as_ref()
    }

    pub fn names(&self) -> &[String; 2] {
        &self.names
    }

    pub fn draw_offer(&self) -> Option<Side> {
        self.draw_offer
    }

    /// The record of the current (or last) match.
    pub fn match_record(&self, match_id: String) -> Option<MatchRecord> {
        self.game
            .as_ref()
            .map(|g| g.to_record(match_id, self.names.clone()))
    }

    /// One update: link state, peer lines, console lines, staged move, flush.
    ///
    /// A staged move is dropped when a disconnect, resignation or accepted
    /// draw ran earlier in the same tick.
    pub fn tick(&mut self, input: TickInput) {
        self.ended_this_tick = false;
        self.sync_link();

        for line in self.transport.poll_lines() {
            if let Err(err) = self.receive(&line) {
                err.report();
            }
        }
        for line in &input.console {
            if let Err(err) = self.execute(line) {
                err.report();
            }
        }
        if let Some(request) = input.selection {
            if self.ended_this_tick {
                tracing::debug!(from = %request.from, to = %request.to, "staged move dropped, gameplay ended this tick");
            } else if let Err(err) = self.submit_move(request) {
                err.report();
            }
        }

        self.transport.flush();
    }

    /// Run a line typed on this console.
    pub fn execute(&mut self, line: &str) -> Result<(), ProtocolError> {
        let envelope = Envelope::parse(line)?;
        self.dispatch(envelope)
    }

    /// Run a line read from the connection. Unmarked lines count as the peer's.
    pub fn receive(&mut self, line: &str) -> Result<(), ProtocolError> {
        let mut envelope = Envelope::parse(line)?;
        if envelope.origin == Origin::Local {
            envelope.origin = Origin::Peer;
        }
        tracing::debug!(%line, "received");
        self.dispatch(envelope)
    }

    /// Apply a move staged by board selection.
    pub fn submit_move(&mut self, request: MoveRequest) -> Result<(), ProtocolError> {
        let command = Command::Move(MoveArgs {
            from: request.from,
            to: request.to,
            promote_to: request.promote_to,
            teleport: request.teleport,
        });
        self.check_gameplay(&command, Origin::Local)?;
        self.play_move(request, Origin::Local)
    }

    /// Leave the console. A running online match is abandoned with a notice.
    pub fn quit(&mut self) {
        if self.session.link != Link::Idle {
            let reason = if self.match_running() {
                QUITTING_MATCH
            } else {
                "quitting"
            };
            self.send_now(Command::Disconnect {
                reason: Some(reason.to_string()),
                spectator: self.session.is_spectating(),
            });
            tracing::info!(reason, "Disconnecting");
        }
        self.tear_down();
        self.transport.flush();
    }

    /// Follow connection changes the transport made on its own.
    pub fn sync_link(&mut self) {
        let state = self.transport.state();
        match (self.session.link, state.link()) {
            (Link::Connecting, Link::Connected) => {
                self.session = self.transition(Transition::LinkUp);
                tracing::info!(state = ?state, "Connected");
                if !self.session.is_spectating() {
                    self.announce_name();
                }
            }
            (Link::Connecting | Link::Connected | Link::Listening, Link::Idle) => {
                tracing::warn!("Connection lost");
                self.return_to_lobby();
                self.session = SessionState::default();
                self.peer_attached = false;
                self.spectators = 0;
            }
            (Link::Listening, Link::Listening) => {
                let attached = state.has_peer();
                if attached && !self.peer_attached {
                    tracing::info!("Opponent connected");
                    self.peer_attached = true;
                    self.announce_name();
                } else if !attached && self.peer_attached {
                    tracing::warn!("Opponent left");
                    self.peer_attached = false;
                    self.return_to_lobby();
                }
                let spectators = state.spectators();
                if spectators > self.spectators {
                    tracing::info!(spectators, "Spectator joined");
                    self.introduce_players();
                }
                self.spectators = spectators;
            }
            _ => {}
        }
    }

    /// Values sent by a `Validate` handshake.
    pub fn snapshot(&self) -> Snapshot {
        let state = self
            .game
            .as_ref()
            .map_or_else(|| "GameOver".to_string(), |g| g.status().to_string());
        Snapshot {
            state: Some(state),
            player1: Some(self.names[0].clone()),
            player2: Some(self.names[1].clone()),
            move_number: self.game.as_ref().map(|g| g.turn()),
            board: self.game.as_ref().map(|g| g.board_string()),
        }
    }

    /// Human-readable session and board summary for the console.
    pub fn status_report(&self) -> String {
        let mut out = format!(
            "Link: {}{}\nPlayers: {} (white) vs {} (black)\n",
            self.session.link,
            if self.session.is_spectating() {
                " (spectating)"
            } else {
                ""
            },
            self.names[0],
            self.names[1],
        );
        match &self.game {
            Some(game) => {
                out.push_str(&game.board().render());
                if game.is_in_progress() {
                    out.push_str(&self.game_state_line(game.turn(), game.side_to_move()));
                } else if let Some(result) = game.result() {
                    out.push_str(&format!("Match over, the Winner is {}", self.winner_label(result)));
                }
                out.push('\n');
            }
            None => out.push_str("No match yet\n"),
        }
        out
    }

    fn dispatch(&mut self, envelope: Envelope) -> Result<(), ProtocolError> {
        let Envelope { command, origin } = envelope;
        if origin != Origin::Local && command.is_network_setup() {
            return Err(ProtocolError::role(format!(
                "{} can only be issued from this console",
                command.name()
            )));
        }
        self.check_gameplay(&command, origin)?;

        let is_move = matches!(command, Command::Move(_));
        let result = match command {
            Command::Listen { port } => self.listen(port),
            Command::Connect {
                ip,
                port,
                spectator,
            } => self.connect(ip, port, spectator),
            Command::ServerInfo { ip, port } => self.server_info(ip, port),
            Command::Disconnect { reason, spectator } => self.disconnect(reason, spectator, origin),
            Command::PlayerInfo { name } => self.player_info(name, origin),
            Command::Begin { first_player } => self.begin(first_player, origin),
            Command::Validate(snapshot) => self.validate(snapshot, origin),
            Command::Move(args) => {
                let mut request = MoveRequest::new(args.from, args.to);
                request.promote_to = args.promote_to;
                request.teleport = args.teleport;
                self.play_move(request, origin)
            }
            Command::Resign => self.resign(origin),
            Command::OfferDraw => self.offer_draw(origin),
            Command::AcceptDraw => self.answer_draw(true, origin),
            Command::RejectDraw => self.answer_draw(false, origin),
        };
        if result.is_ok() && origin != Origin::Local && !is_move {
            self.presenter.play_sound(SoundCue::Info);
        }
        result
    }

    /// Seat and connection checks shared by every gameplay command.
    fn check_gameplay(&mut self, command: &Command, origin: Origin) -> Result<(), ProtocolError> {
        if !command.is_gameplay() {
            return Ok(());
        }
        if self.session.is_spectating() {
            match origin {
                Origin::Local => {
                    self.presenter.play_sound(SoundCue::Error);
                    return Err(ProtocolError::role(format!(
                        "You cannot {} in a game that you are spectating",
                        command.action()
                    )));
                }
                Origin::Relay => {
                    tracing::info!(
                        "A player is trying to {} in a game that you are spectating",
                        command.action()
                    );
                }
                Origin::Peer => {}
            }
        }
        if self.session.link == Link::Connecting {
            return Err(ProtocolError::role(format!(
                "Cannot {} while still connecting",
                command.action()
            )));
        }
        Ok(())
    }

    fn listen(&mut self, port: Setting<u16>) -> Result<(), ProtocolError> {
        if self.session.link == Link::Listening && self.transport.state().has_peer() {
            return Err(ProtocolError::role("Cannot listen again while a client is attached"));
        }
        let next = self.session.apply(Transition::Listen)?;
        let port = fallback("port", port, self.config.port);
        self.transport.listen(port)?;
        self.config.port = port;
        self.session = next;
        self.peer_attached = false;
        self.spectators = 0;
        self.claim_local_name();
        tracing::info!(port, "Listening for an opponent");
        Ok(())
    }

    fn connect(
        &mut self,
        ip: Setting<IpAddr>,
        port: Setting<u16>,
        spectator: bool,
    ) -> Result<(), ProtocolError> {
        let next = self.session.apply(Transition::Connect { spectator })?;
        let ip = fallback("ip", ip, self.config.ip);
        let port = fallback("port", port, self.config.port);
        self.transport.connect(ip, port)?;
        self.config.ip = ip;
        self.config.port = port;
        self.session = next;
        if !spectator {
            self.claim_local_name();
        }
        tracing::info!(%ip, port, spectator, "Connecting");
        Ok(())
    }

    fn server_info(&mut self, ip: Setting<IpAddr>, port: Setting<u16>) -> Result<(), ProtocolError> {
        let changing = ip != Setting::Absent || port != Setting::Absent;
        if changing && self.session.link != Link::Idle {
            return Err(ProtocolError::role(format!(
                "Cannot change the server address while {}",
                self.session.link
            )));
        }
        self.config.ip = fallback_quiet("ip", ip, self.config.ip);
        self.config.port = fallback_quiet("port", port, self.config.port);
        tracing::info!(
            ip = %self.config.ip,
            port = self.config.port,
            link = %self.session.link,
            "Server info"
        );
        Ok(())
    }

    fn disconnect(
        &mut self,
        reason: Option<String>,
        spectator: bool,
        origin: Origin,
    ) -> Result<(), ProtocolError> {
        let reason_text = reason.clone().unwrap_or_else(|| "no reason given".to_string());
        match origin {
            Origin::Local => {
                if self.session.link == Link::Idle {
                    return Err(ProtocolError::role("Not connected"));
                }
                self.send_now(Command::Disconnect {
                    reason,
                    spectator: spectator || self.session.is_spectating(),
                });
                tracing::info!(reason = %reason_text, "Disconnected");
            }
            Origin::Peer if spectator => {
                tracing::info!(reason = %reason_text, "A spectator left");
                return Ok(());
            }
            Origin::Peer | Origin::Relay => {
                tracing::info!(reason = %reason_text, "Opponent disconnected");
                if self.session.is_server() {
                    let notice = Envelope::new(
                        Command::Disconnect {
                            reason,
                            spectator: false,
                        },
                        Origin::Relay,
                    );
                    self.transport.send_now_to_spectators(notice.to_string());
                }
            }
        }
        self.tear_down();
        Ok(())
    }

    fn player_info(&mut self, name: Option<String>, origin: Origin) -> Result<(), ProtocolError> {
        let name = name.ok_or(ArgumentError::Missing {
            command: "PlayerInfo",
            key: "name",
        })?;
        let side = match origin {
            Origin::Local => self.session.local_side(),
            _ => self.issuer(origin),
        };
        let other = &self.names[side.opponent().index()];
        if other.eq_ignore_ascii_case(&name) {
            return Err(ProtocolError::role(format!(
                "Name '{name}' is already used by the other player"
            )));
        }
        tracing::info!(%side, from = %self.names[side.index()], to = %name, "Player renamed");
        self.names[side.index()] = name.clone();
        if origin == Origin::Local {
            self.local_name = Some(name.clone());
        }
        self.propagate(&Command::PlayerInfo { name: Some(name) }, origin);
        Ok(())
    }

    fn begin(&mut self, first_player: Option<String>, origin: Origin) -> Result<(), ProtocolError> {
        if self.match_running() {
            return Err(ProtocolError::role("A match is already in progress"));
        }
        let first = match &first_player {
            None => self.issuer(origin),
            Some(name) => self.side_named(name).ok_or_else(|| ArgumentError::Invalid {
                command: "Begin",
                key: "firstPlayer",
                value: name.clone(),
                reason: format!("expected {} or {}", self.names[0], self.names[1]),
            })?,
        };

        let mut game = MatchController::new();
        game.start_match(&self.config.layout, first)
            .map_err(|e| ProtocolError::role(format!("Cannot start a match: {e}")))?;
        self.game = Some(game);
        self.draw_offer = None;
        self.session = self.transition(Transition::BeginMatch);

        self.presenter.phase_changed(Phase::InMatch);
        self.presenter.play_sound(SoundCue::MatchStart);
        self.presenter.turn_changed(first, 1);
        tracing::info!(first = %first, "Match begins");
        tracing::info!("{}", self.game_state_line(1, first));

        let first_name = self.names[first.index()].clone();
        self.propagate(
            &Command::Begin {
                first_player: Some(first_name),
            },
            origin,
        );
        Ok(())
    }

    fn validate(&mut self, received: Snapshot, origin: Origin) -> Result<(), ProtocolError> {
        let local = self.snapshot();
        if origin == Origin::Local {
            if self.session.is_spectating() {
                self.presenter.play_sound(SoundCue::Error);
                return Err(ProtocolError::role(
                    "You cannot validate a game that you are spectating",
                ));
            }
            if self.session.link == Link::Idle {
                return Err(ProtocolError::role("Not connected to anyone to validate against"));
            }
            for (field, given, mine) in snapshot_fields(&received, &local) {
                match given {
                    None => tracing::warn!(field, "Validate: no {field} given, using the local value"),
                    Some(v) if Some(&v) != mine.as_ref() => tracing::warn!(
                        field,
                        given = %v,
                        local = mine.as_deref().unwrap_or(""),
                        "Validate: {field} differs from the local value, sending the local one"
                    ),
                    Some(_) => {}
                }
            }
            self.send_to_peer(&Command::Validate(local));
            return Ok(());
        }

        // mid-match every field but the move number must be given
        let in_match = self.game.is_some();
        let discrepancies: Vec<Discrepancy> = snapshot_fields(&received, &local)
            .into_iter()
            .filter(|(field, _, _)| in_match || *field == "state")
            .filter_map(|(field, given, mine)| {
                let given = match given {
                    Some(v) => v,
                    None if in_match && field != "move" => String::new(),
                    None => return None,
                };
                let mine = mine.unwrap_or_default();
                (given != mine).then_some(Discrepancy {
                    field,
                    local: mine,
                    received: given,
                })
            })
            .collect();

        if discrepancies.is_empty() {
            tracing::info!("Validation passed");
            return Ok(());
        }
        for d in &discrepancies {
            tracing::warn!(
                field = d.field,
                local = %d.local,
                received = %d.received,
                "Validation mismatch"
            );
        }
        self.send_now(Command::Disconnect {
            reason: Some(VALIDATION_FAILED.to_string()),
            spectator: self.session.is_spectating(),
        });
        if self.session.is_server() {
            let notice = Envelope::new(
                Command::Disconnect {
                    reason: Some(VALIDATION_FAILED.to_string()),
                    spectator: false,
                },
                Origin::Relay,
            );
            self.transport.send_now_to_spectators(notice.to_string());
        }
        self.tear_down();
        Err(ProtocolError::Desync(discrepancies))
    }

    fn play_move(&mut self, request: MoveRequest, origin: Origin) -> Result<(), ProtocolError> {
        let issuer = self.issuer(origin);
        let rejected = |e: RuleViolation| match origin {
            Origin::Local => ProtocolError::Rule(e),
            _ => ProtocolError::PeerRule(e),
        };
        let game = self
            .game
            .as_mut()
            .ok_or_else(|| rejected(RuleViolation::NoMatch))?;
        if game.is_in_progress() && issuer != game.side_to_move() {
            return Err(match origin {
                Origin::Local => ProtocolError::role("It is not your turn"),
                _ => ProtocolError::role("Opponent moved out of turn"),
            });
        }
        let resolution = game.validate(&request).map_err(rejected)?;
        game.apply_move(&resolution).map_err(rejected)?;

        let cue = if resolution.is_capture() {
            SoundCue::Capture
        } else {
            SoundCue::Move
        };
        self.presenter.play_sound(cue);

        let sent = Command::Move(MoveArgs {
            from: resolution.from,
            to: resolution.to,
            promote_to: resolution.promotion.map(|p| p.kind),
            teleport: resolution.teleport,
        });
        self.propagate(&sent, origin);
        self.flush_match_events();
        Ok(())
    }

    fn resign(&mut self, origin: Origin) -> Result<(), ProtocolError> {
        let issuer = self.issuer(origin);
        let game = self.game.as_mut().ok_or(RuleViolation::NoMatch)?;
        game.resign(issuer)?;
        tracing::info!(side = %issuer, "{} resigns", self.names[issuer.index()]);
        self.ended_this_tick = true;
        self.propagate(&Command::Resign, origin);
        self.flush_match_events();
        Ok(())
    }

    fn offer_draw(&mut self, origin: Origin) -> Result<(), ProtocolError> {
        self.require_running_match()?;
        let issuer = self.issuer(origin);
        match self.draw_offer {
            Some(side) if side == issuer => {
                tracing::warn!(side = %issuer, "A draw offer is already pending");
                return Ok(());
            }
            Some(_) => {
                tracing::info!("Both sides offered a draw");
                self.propagate(&Command::OfferDraw, origin);
                return self.agree_draw();
            }
            None => {
                self.draw_offer = Some(issuer);
                tracing::info!(side = %issuer, "{} offers a draw", self.names[issuer.index()]);
            }
        }
        self.propagate(&Command::OfferDraw, origin);
        Ok(())
    }

    fn answer_draw(&mut self, accept: bool, origin: Origin) -> Result<(), ProtocolError> {
        self.require_running_match()?;
        let answering = match (origin, self.draw_offer) {
            (Origin::Local, Some(offered)) if !self.transport.state().has_peer() => offered.opponent(),
            _ => self.issuer(origin),
        };
        let pending = self.draw_offer == Some(answering.opponent());
        if !pending {
            if origin == Origin::Local {
                return Err(ProtocolError::role("There is no draw offer to answer"));
            }
            tracing::warn!(side = %answering, accept, "Opponent answered a draw offer that was never made");
        }

        let command = if accept {
            Command::AcceptDraw
        } else {
            Command::RejectDraw
        };
        self.propagate(&command, origin);
        if accept {
            self.agree_draw()
        } else {
            self.draw_offer = None;
            tracing::info!(side = %answering, "Draw offer rejected");
            Ok(())
        }
    }

    fn agree_draw(&mut self) -> Result<(), ProtocolError> {
        self.draw_offer = None;
        let game = self.game.as_mut().ok_or(RuleViolation::NoMatch)?;
        game.set_result_and_end(MatchResult::Draw, EndCause::AgreedDraw)?;
        self.ended_this_tick = true;
        self.flush_match_events();
        Ok(())
    }

    /// Log and forward everything the controller queued.
    fn flush_match_events(&mut self) {
        let events = match self.game.as_mut() {
            Some(game) => game.drain_events(),
            None => return,
        };
        for event in events {
            match &event {
                MatchEvent::TurnChanged { turn, side_to_move } => {
                    self.draw_offer = None;
                    self.presenter.turn_changed(*side_to_move, *turn);
                    tracing::info!("{}", self.game_state_line(*turn, *side_to_move));
                }
                MatchEvent::MatchEnded { result, cause } => {
                    tracing::info!(cause = %cause, "Match Ends, the Winner is {}", self.winner_label(*result));
                    self.presenter.play_sound(SoundCue::MatchEnd);
                }
                other => tracing::info!("{other}"),
            }
            self.presenter.match_event(&event);
            if matches!(event, MatchEvent::MatchEnded { .. }) {
                self.leave_match();
            }
        }
    }

    fn leave_match(&mut self) {
        self.draw_offer = None;
        if self.session.phase == Phase::InMatch {
            self.session = self.transition(Transition::LeaveMatch);
            self.presenter.phase_changed(Phase::Lobby);
        }
    }

    /// Abandon a running match and go back to the lobby.
    fn return_to_lobby(&mut self) {
        if let Some(game) = self.game.as_mut() {
            if game.is_in_progress() {
                let _ = game.set_result_and_end(MatchResult::Undetermined, EndCause::Aborted);
            }
        }
        self.flush_match_events();
        self.leave_match();
    }

    fn tear_down(&mut self) {
        self.transport.disconnect();
        self.return_to_lobby();
        self.session = SessionState::default();
        self.peer_attached = false;
        self.spectators = 0;
        self.ended_this_tick = true;
    }

    fn propagate(&mut self, command: &Command, origin: Origin) {
        match origin {
            Origin::Local => self.send_to_peer(command),
            Origin::Peer => self.relay_to_spectators(command),
            Origin::Relay => {}
        }
    }

    /// Queue a local command for the other side, marked `remote=true`.
    pub fn send_to_peer(&mut self, command: &Command) {
        if self.session.link == Link::Idle {
            tracing::debug!(command = command.name(), "offline, nothing sent");
            return;
        }
        let line = Envelope::new(command.clone(), Origin::Peer).to_string();
        tracing::debug!(%line, "queued for peer");
        self.transport.queue_outgoing(line);
    }

    /// Queue a peer command for the spectators, marked `fromServer=true`.
    pub fn relay_to_spectators(&mut self, command: &Command) {
        if !self.session.is_server() {
            return;
        }
        let line = Envelope::new(command.clone(), Origin::Relay).to_string();
        tracing::debug!(%line, "queued for spectators");
        self.transport.queue_to_spectators(line);
    }

    fn send_now(&mut self, command: Command) {
        let line = Envelope::new(command, Origin::Peer).to_string();
        tracing::debug!(%line, "sent immediately");
        self.transport.send_now(line);
    }

    /// The side a command speaks for.
    fn issuer(&self, origin: Origin) -> Side {
        match origin {
            Origin::Local if self.transport.state().has_peer() => self.session.local_side(),
            Origin::Local => self
                .game
                .as_ref()
                .map_or(Side::White, |g| g.side_to_move()),
            Origin::Peer => self.session.local_side().opponent(),
            // the server's peer is always the client
            Origin::Relay => Side::Black,
        }
    }

    fn side_named(&self, name: &str) -> Option<Side> {
        if let Some(index) = self.names.iter().position(|n| n.eq_ignore_ascii_case(name)) {
            return Side::from_index(index);
        }
        match name.to_ascii_lowercase().as_str() {
            "white" | "player1" => Some(Side::White),
            "black" | "player2" => Some(Side::Black),
            _ => None,
        }
    }

    fn claim_local_name(&mut self) {
        let Some(name) = self.local_name.clone() else {
            return;
        };
        let side = self.session.local_side();
        if self.names[side.opponent().index()].eq_ignore_ascii_case(&name) {
            tracing::warn!(%name, "Name already used by the other side, keeping the default");
            return;
        }
        self.names[side.index()] = name;
    }

    fn announce_name(&mut self) {
        let name = self.names[self.session.local_side().index()].clone();
        self.send_to_peer(&Command::PlayerInfo { name: Some(name) });
    }

    /// Send both names to the spectators. A spectator reads `remote=true`
    /// as White and `fromServer=true` as Black.
    fn introduce_players(&mut self) {
        let [white, black] = self.names.clone();
        for (name, origin) in [(white, Origin::Peer), (black, Origin::Relay)] {
            let line = Envelope::new(Command::PlayerInfo { name: Some(name) }, origin).to_string();
            self.transport.send_now_to_spectators(line);
        }
    }

    fn match_running(&self) -> bool {
        self.game.as_ref().is_some_and(|g| g.is_in_progress())
    }

    fn require_running_match(&self) -> Result<(), ProtocolError> {
        match &self.game {
            None => Err(RuleViolation::NoMatch.into()),
            Some(g) if g.is_over() => Err(RuleViolation::MatchEnded.into()),
            Some(_) => Ok(()),
        }
    }

    fn transition(&self, transition: Transition) -> SessionState {
        // only called with transitions that are legal from any reachable state
        self.session.apply(transition).unwrap_or(self.session)
    }

    fn game_state_line(&self, turn: u32, side: Side) -> String {
        format!("Game State: Turn #{turn}, {}'s Turn", self.names[side.index()])
    }

    fn winner_label(&self, result: MatchResult) -> String {
        match result {
            MatchResult::Draw => "No One (Draw)".to_string(),
            MatchResult::Undetermined => "Non-Determined".to_string(),
            other => other
                .winner()
                .map_or_else(String::new, |side| self.names[side.index()].clone()),
        }
    }
}

/// Use `value`, or warn and keep `previous`.
fn fallback<V: Copy + std::fmt::Display>(key: &'static str, value: Setting<V>, previous: V) -> V {
    match value {
        Setting::Valid(v) => v,
        Setting::Absent => {
            tracing::warn!(key, %previous, "No {key} given, using {previous}");
            previous
        }
        Setting::Invalid(raw) => {
            tracing::warn!(key, %raw, %previous, "Invalid {key} '{raw}', using {previous}");
            previous
        }
    }
}

/// Like [`fallback`], but an absent value is not worth a warning.
fn fallback_quiet<V: Copy + std::fmt::Display>(
    key: &'static str,
    value: Setting<V>,
    previous: V,
) -> V {
    match value {
        Setting::Absent => previous,
        other => fallback(key, other, previous),
    }
}

type FieldPair = (&'static str, Option<String>, Option<String>);

fn snapshot_fields(received: &Snapshot, local: &Snapshot) -> Vec<FieldPair> {
    vec![
        ("state", received.state.clone(), local.state.clone()),
        ("player1", received.player1.clone(), local.player1.clone()),
        ("player2", received.player2.clone(), local.player2.clone()),
        (
            "move",
            received.move_number.map(|n| n.to_string()),
            local.move_number.map(|n| n.to_string()),
        ),
        ("board", received.board.clone(), local.board.clone()),
    ]
}
