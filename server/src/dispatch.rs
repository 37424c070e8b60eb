//! Request dispatch
//!
//! Turns one decoded request from one peer into state changes and the
//! messages they cause. The network layer owns the single [`Dispatcher`]
//! and feeds it datagrams one at a time, so every request runs to
//! completion before the next is looked at.

use crate::client_manager::{ClientRef, PlayerId};
use crate::config::GameConfig;
use crate::game::GameState;
use crate::grid::Pos;
use crate::movement::{is_repeat_key, resolve_move, Direction, MoveOutcome};
use crate::visibility::refresh_player_view;
use log::{debug, error, info, warn};
use shared::{Message, ProtocolError, QuitReason, Request, VOID};
use std::net::SocketAddr;

/// A message addressed to one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub addr: SocketAddr,
    pub message: Message,
}

/// Everything one request produced.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub outbox: Vec<Outbound>,
    /// Set once the last nugget has been collected
    pub game_over: bool,
}

impl Dispatch {
    fn send(&mut self, addr: SocketAddr, message: Message) {
        self.outbox.push(Outbound { addr, message });
    }

    /// Messages for one peer, in sending order.
    pub fn messages_to(&self, addr: SocketAddr) -> Vec<&Message> {
        self.outbox
            .iter()
            .filter(|out| out.addr == addr)
            .map(|out| &out.message)
            .collect()
    }
}

pub struct Dispatcher {
    game: GameState,
    config: GameConfig,
}

impl Dispatcher {
    pub fn new(game: GameState, config: GameConfig) -> Self {
        Self { game, config }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    /// Handles one request line from `addr`.
    pub fn handle(&mut self, addr: SocketAddr, text: &str) -> Dispatch {
        let mut out = Dispatch::default();
        if self.game.is_finished() {
            debug!("Ignoring message from {} after game over", addr);
            return out;
        }

        match Request::parse(text, self.config.max_name_length) {
            Ok(Request::Play { name }) => self.handle_play(addr, Some(name), &mut out),
            Err(ProtocolError::MissingName) => self.handle_play(addr, None, &mut out),
            Ok(Request::Spectate) => self.handle_spectate(addr, &mut out),
            Ok(Request::Key(key)) => self.handle_key(addr, key, &mut out),
            Err(e) => warn!("Malformed message from {}: {}", addr, e),
        }

        out
    }

    fn is_full(&self) -> bool {
        self.game.clients().joined() >= self.config.max_players
    }

    fn handle_play(&mut self, addr: SocketAddr, name: Option<String>, out: &mut Dispatch) {
        if self.game.find_by_addr(addr).is_some() {
            warn!("{} tried to join twice", addr);
            return;
        }
        if self.is_full() {
            info!("Rejecting {}: game is full", addr);
            out.send(addr, Message::Quit(QuitReason::GameFull));
            return;
        }
        let name = match name {
            Some(name) => name,
            None => {
                warn!("Rejecting {}: no player name", addr);
                out.send(addr, Message::Quit(QuitReason::MissingName));
                return;
            }
        };

        match self.game.join_player(name, addr) {
            Ok(id) => {
                out.send(addr, Message::Ok { id });
                self.inform_new_client(ClientRef::Player(id), out);
                if let Some(pos) = self.game.find_by_id(id).map(|player| player.pos) {
                    self.update_displays(pos, None, out);
                }
            }
            Err(e) => {
                warn!("Could not add player from {}: {}", addr, e);
                out.send(addr, Message::Quit(QuitReason::GameFull));
            }
        }
    }

    fn handle_spectate(&mut self, addr: SocketAddr, out: &mut Dispatch) {
        if let Some(ClientRef::Player(id)) = self.game.find_by_addr(addr) {
            warn!("Player {} at {} asked to spectate", id, addr);
            return;
        }
        if let Some(previous) = self.game.remove_spectator() {
            info!("Spectator {} replaced by {}", previous.addr, addr);
            out.send(previous.addr, Message::Quit(QuitReason::SpectatorReplaced));
        }

        self.game.join_spectator(addr);
        self.inform_new_client(ClientRef::Spectator, out);
    }

    fn handle_key(&mut self, addr: SocketAddr, key: char, out: &mut Dispatch) {
        let quit = key.eq_ignore_ascii_case(&'q');

        match self.game.find_by_addr(addr) {
            None => warn!("Key from unknown client {}", addr),
            Some(ClientRef::Spectator) => {
                if quit {
                    out.send(addr, Message::Quit(QuitReason::ThanksForWatching));
                    self.game.remove_spectator();
                } else {
                    debug!("Spectator sent key {:?}", key);
                }
            }
            Some(ClientRef::Player(id)) if quit => {
                out.send(addr, Message::Quit(QuitReason::ThanksForPlaying));
                if let Some(pos) = self.game.remove_player(id) {
                    self.update_displays(pos, None, out);
                }
            }
            Some(ClientRef::Player(id)) => match Direction::from_key(key) {
                Some(direction) => self.move_player(id, direction, is_repeat_key(key), out),
                None => warn!("Player {} sent unknown key {:?}", id, key),
            },
        }
    }

    fn move_player(&mut self, id: PlayerId, direction: Direction, repeat: bool, out: &mut Dispatch) {
        loop {
            let before = match self.game.find_by_id(id) {
                Some(player) => player.pos,
                None => return,
            };
            let outcome = match resolve_move(&mut self.game, id, direction) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Move by player {} failed: {}", id, e);
                    return;
                }
            };
            let after = self.game.find_by_id(id).map_or(before, |player| player.pos);

            match outcome {
                MoveOutcome::Blocked => return,
                MoveOutcome::Moved | MoveOutcome::Swapped { .. } => {
                    self.update_displays(before, Some(after), out);
                }
                MoveOutcome::PickedUp { nuggets } => {
                    self.send_gold(id, nuggets, out);
                    self.update_displays(before, Some(after), out);
                }
                MoveOutcome::GameOver { nuggets } => {
                    self.send_gold(id, nuggets, out);
                    self.update_displays(before, Some(after), out);
                    self.end_game(out);
                    return;
                }
            }

            if !repeat {
                return;
            }
        }
    }

    /// GRID, GOLD and DISPLAY for a client that just arrived.
    fn inform_new_client(&self, client: ClientRef, out: &mut Dispatch) {
        let (addr, purse) = match client {
            ClientRef::Player(id) => match self.game.find_by_id(id) {
                Some(player) => (player.addr, player.purse),
                None => return,
            },
            ClientRef::Spectator => match self.game.clients().spectator() {
                Some(spectator) => (spectator.addr, 0),
                None => return,
            },
        };

        let grid = self.game.grid();
        out.send(
            addr,
            Message::Grid {
                rows: grid.rows(),
                columns: grid.columns(),
            },
        );
        out.send(
            addr,
            Message::Gold {
                collected: 0,
                purse,
                remaining: self.game.gold_remaining(),
            },
        );
        if let Some(display) = self.display_for(client) {
            out.send(addr, display);
        }
    }

    fn display_for(&self, client: ClientRef) -> Option<Message> {
        let grid = self.game.grid();
        let map = match client {
            ClientRef::Player(id) => grid.render(self.game.find_by_id(id)?.view.as_ref()),
            ClientRef::Spectator => grid.render(None),
        };
        Some(Message::Display { map })
    }

    /// Tells the collector what it found and everyone else the new total.
    fn send_gold(&self, collector: PlayerId, nuggets: u32, out: &mut Dispatch) {
        let remaining = self.game.gold_remaining();

        for player in self.game.clients().active_players() {
            let collected = if player.id == collector { nuggets } else { 0 };
            out.send(
                player.addr,
                Message::Gold {
                    collected,
                    purse: player.purse,
                    remaining,
                },
            );
        }
        if let Some(spectator) = self.game.clients().spectator() {
            out.send(
                spectator.addr,
                Message::Gold {
                    collected: 0,
                    purse: 0,
                    remaining,
                },
            );
        }
    }

    /// Pushes new displays after the cells at `first` and `second` changed.
    ///
    /// The spectator always gets one. A player is refreshed only if its view
    /// already shows one of the changed cells, and only sent a display when
    /// the refresh changed something.
    fn update_displays(&mut self, first: Pos, second: Option<Pos>, out: &mut Dispatch) {
        if let Some(spectator) = self.game.clients().spectator() {
            if let Some(display) = self.display_for(ClientRef::Spectator) {
                out.send(spectator.addr, display);
            }
        }

        let watchers: Vec<(PlayerId, SocketAddr)> = self
            .game
            .clients()
            .active_players()
            .filter(|player| {
                player.view.as_ref().is_some_and(|view| {
                    let shows = |pos: Pos| view.get(pos).is_some_and(|symbol| symbol != VOID);
                    shows(first) || second.is_some_and(shows)
                })
            })
            .map(|player| (player.id, player.addr))
            .collect();

        for (id, addr) in watchers {
            if refresh_player_view(&mut self.game, id) {
                if let Some(display) = self.display_for(ClientRef::Player(id)) {
                    out.send(addr, display);
                }
            }
        }
    }

    fn end_game(&mut self, out: &mut Dispatch) {
        let board = self.game.leaderboard();
        info!("Game over after {} players joined", board.len());

        let message = Message::Quit(QuitReason::GameOver(board));
        let mut recipients: Vec<SocketAddr> = self
            .game
            .clients()
            .active_players()
            .map(|player| player.addr)
            .collect();
        if let Some(spectator) = self.game.clients().spectator() {
            recipients.push(spectator.addr);
        }

        for addr in recipients {
            out.send(addr, message.clone());
        }
        out.game_over = true;
    }
}
