//! Integration tests for the game server
//!
//! These tests drive the public APIs of `shared` and `server` together,
//! finishing with a real UDP session against a running server.

use rand::rngs::StdRng;
use rand::SeedableRng;
use server::config::GameConfig;
use server::dispatch::Dispatcher;
use server::game::GameState;
use server::grid::Grid;
use server::network::{decode_datagram, Server, MAX_DATAGRAM};
use shared::{Message, QuitReason, Request, ScoreLine};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tokio_test::assert_ok;

const CORRIDOR: &str = "\
+-------+
|.......|
+-------+";

/// A corridor holding one pile of ten nuggets.
fn corridor_game(seed: u64) -> GameState {
    let grid = Grid::parse(CORRIDOR).unwrap();
    let mut game = GameState::new(grid, StdRng::seed_from_u64(seed));
    game.load_gold(10, 1, 1).unwrap();
    game
}

fn peer(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// PROTOCOL TESTS
mod protocol_tests {
    use super::*;

    #[test]
    fn requests_and_replies_share_one_text_format() {
        assert_eq!(
            Request::parse("PLAY Ada Lovelace", 50).unwrap(),
            Request::Play {
                name: "Ada Lovelace".to_string()
            }
        );
        assert_eq!(Request::parse("KEY K", 50).unwrap(), Request::Key('K'));

        let board = QuitReason::GameOver(vec![ScoreLine {
            id: 'A',
            gold: 250,
            name: "Ada".to_string(),
        }]);
        assert_eq!(
            Message::Quit(board).to_string(),
            "QUIT GAME OVER:\nA       250 Ada"
        );
    }
}

/// GAMEPLAY TESTS
mod gameplay_tests {
    use super::*;

    #[test]
    fn spectator_sees_whole_map_with_gold() {
        let game = corridor_game(3);
        let expected = game.grid().render(None);
        let mut dispatcher = Dispatcher::new(game, GameConfig::default());

        let out = dispatcher.handle(peer(9000), "SPECTATE");
        let messages = out.messages_to(peer(9000));
        assert_eq!(
            messages[1],
            &Message::Gold {
                collected: 0,
                purse: 0,
                remaining: 10
            }
        );
        assert_eq!(messages[2], &Message::Display { map: expected.clone() });
        assert!(expected.contains('*'));
    }

    #[test]
    fn sweeping_the_corridor_ends_the_game() {
        for seed in 1..20 {
            let mut dispatcher = Dispatcher::new(corridor_game(seed), GameConfig::default());
            dispatcher.handle(peer(9001), "PLAY runner");

            let mut game_over = dispatcher.handle(peer(9001), "KEY L").game_over;
            if !game_over {
                game_over = dispatcher.handle(peer(9001), "KEY H").game_over;
            }

            assert!(game_over, "seed {} left gold behind", seed);
            assert!(dispatcher.game().is_finished());
            assert_eq!(dispatcher.game().gold_remaining(), 0);
            assert_eq!(dispatcher.game().leaderboard()[0].gold, 10);
        }
    }

    #[test]
    fn player_cap_comes_from_config() {
        let config = GameConfig::from_toml("max_players = 2").unwrap();
        let mut dispatcher = Dispatcher::new(corridor_game(5), config);

        dispatcher.handle(peer(1), "PLAY a");
        dispatcher.handle(peer(2), "PLAY b");
        let out = dispatcher.handle(peer(3), "PLAY c");
        assert_eq!(
            out.messages_to(peer(3)),
            vec![&Message::Quit(QuitReason::GameFull)]
        );
    }
}

/// NETWORK TESTS
mod network_tests {
    use super::*;

    async fn recv_text(socket: &UdpSocket) -> String {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let (len, _) = timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
            .await
            .expect("timed out waiting for server")
            .expect("recv failed");
        decode_datagram(&buf[..len])
    }

    #[tokio::test]
    async fn udp_session_from_join_to_game_over() {
        let dispatcher = Dispatcher::new(corridor_game(11), GameConfig::default());
        let mut server = assert_ok!(Server::new("127.0.0.1:0", dispatcher).await);
        let server_addr = assert_ok!(server.local_addr());
        let handle = tokio::spawn(async move { server.run().await });

        let client = assert_ok!(UdpSocket::bind("127.0.0.1:0").await);
        assert_ok!(client.send_to(b"PLAY alice", server_addr).await);

        assert_eq!(recv_text(&client).await, "OK A");
        assert_eq!(recv_text(&client).await, "GRID 3 9");
        assert_eq!(recv_text(&client).await, "GOLD 0 0 10");
        assert!(recv_text(&client).await.starts_with("DISPLAY\n+-------+"));

        // Sweep right then left; one of the runs crosses the pile
        assert_ok!(client.send_to(b"KEY L", server_addr).await);
        assert_ok!(client.send_to(b"KEY H", server_addr).await);

        let mut saw_gold = false;
        loop {
            let text = recv_text(&client).await;
            if text == "GOLD 10 10 0" {
                saw_gold = true;
            }
            if text.starts_with("QUIT") {
                assert_eq!(text, "QUIT GAME OVER:\nA        10 alice");
                break;
            }
        }
        assert!(saw_gold);

        let result = timeout(Duration::from_secs(2), handle)
            .await
            .expect("server did not stop after game over");
        assert_ok!(assert_ok!(result));
    }

    #[tokio::test]
    async fn unknown_peer_gets_no_reply() {
        let dispatcher = Dispatcher::new(corridor_game(2), GameConfig::default());
        let mut server = assert_ok!(Server::new("127.0.0.1:0", dispatcher).await);
        let server_addr = assert_ok!(server.local_addr());
        let handle = tokio::spawn(async move { server.run().await });

        let client = assert_ok!(UdpSocket::bind("127.0.0.1:0").await);
        assert_ok!(client.send_to(b"KEY h", server_addr).await);
        assert_ok!(client.send_to(b"SPECTATE", server_addr).await);

        // The first reply is for the spectate request
        assert_eq!(recv_text(&client).await, "GRID 3 9");
        handle.abort();
    }
}
