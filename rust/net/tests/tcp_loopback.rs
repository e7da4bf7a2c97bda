use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use netchess_engine::coord::Coordinate;
use netchess_engine::game::MatchResult;
use netchess_net::{
    CommandProtocol, ConnectionState, Link, NullPresenter, Phase, SessionConfig, TcpTransport,
    TickInput, Transport,
};
use tokio::runtime::Handle;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind fixture");
    listener.local_addr().expect("listener address").port()
}

async fn poll_until<F>(mut step: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..300 {
        if step() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lines_cross_a_loopback_connection() {
    let port = free_port();
    let mut server = TcpTransport::new(Handle::current());
    server.listen(port).expect("listen");

    let mut client = TcpTransport::new(Handle::current());
    client
        .connect(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
        .expect("connect");

    poll_until(|| {
        server.poll_lines();
        client.poll_lines();
        server.state().has_peer() && client.state().link() == Link::Connected
    })
    .await;

    client.queue_outgoing("Resign remote=true".into());
    client.flush();
    let mut received = Vec::new();
    poll_until(|| {
        received.extend(server.poll_lines());
        !received.is_empty()
    })
    .await;
    assert_eq!(received, vec!["Resign remote=true".to_string()]);

    server.send_now("PlayerInfo remote=true name=Host".into());
    let mut received = Vec::new();
    poll_until(|| {
        received.extend(client.poll_lines());
        !received.is_empty()
    })
    .await;
    assert_eq!(received, vec!["PlayerInfo remote=true name=Host".to_string()]);

    client.disconnect();
    poll_until(|| {
        server.poll_lines();
        !server.state().has_peer()
    })
    .await;
    assert!(matches!(server.state(), ConnectionState::Listening { clients: 0, .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn listening_twice_on_one_port_fails() {
    let port = free_port();
    let mut first = TcpTransport::new(Handle::current());
    first.listen(port).expect("first listen");
    let mut second = TcpTransport::new(Handle::current());
    assert!(second.listen(port).is_err());
    assert_eq!(second.state(), ConnectionState::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn two_protocols_begin_a_match_over_tcp() {
    let port = free_port();
    let config = SessionConfig {
        port,
        ..SessionConfig::default()
    };
    let mut host = CommandProtocol::new(
        config.clone(),
        TcpTransport::new(Handle::current()),
        NullPresenter,
    );
    let mut guest = CommandProtocol::new(config, TcpTransport::new(Handle::current()), NullPresenter)
        .with_local_name("Guest");

    host.tick(TickInput::console("Listen"));
    guest.tick(TickInput::console("Connect"));
    poll_until(|| {
        host.tick(TickInput::default());
        guest.tick(TickInput::default());
        host.names()[1] == "Guest"
    })
    .await;

    host.tick(TickInput::console("Begin"));
    host.tick(TickInput::console("Move from=e2 to=e4"));
    poll_until(|| {
        guest.tick(TickInput::default());
        guest.game().is_some_and(|g| g.turn() == 2)
    })
    .await;
    assert_eq!(
        guest.game().map(|g| g.board_string()),
        host.game().map(|g| g.board_string())
    );

    guest.quit();
    poll_until(|| {
        host.tick(TickInput::default());
        host.session().link == Link::Idle
    })
    .await;
}

fn sq(s: &str) -> Coordinate {
    s.parse().expect("square")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn spectator_lines_are_ignored_and_peer_drop_ends_the_match() {
    let port = free_port();
    let config = SessionConfig {
        port,
        ..SessionConfig::default()
    };
    let mut host = CommandProtocol::new(config, TcpTransport::new(Handle::current()), NullPresenter);
    host.tick(TickInput::console("Listen"));
    let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);

    let mut peer = TcpTransport::new(Handle::current());
    peer.connect(localhost, port).expect("peer connect");
    poll_until(|| {
        host.tick(TickInput::default());
        peer.poll_lines();
        host.transport().state().has_peer() && peer.state().link() == Link::Connected
    })
    .await;

    let mut watcher = TcpTransport::new(Handle::current());
    watcher.connect(localhost, port).expect("spectator connect");
    poll_until(|| {
        host.tick(TickInput::default());
        watcher.poll_lines();
        host.transport().state().spectators() == 1 && watcher.state().link() == Link::Connected
    })
    .await;

    host.tick(TickInput::console("Begin"));
    host.tick(TickInput::console("Move from=e2 to=e4"));

    watcher.queue_outgoing("Move remote=true from=e7 to=e5".into());
    watcher.flush();
    for _ in 0..20 {
        host.tick(TickInput::default());
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(host.game().expect("match").turn(), 2);

    peer.queue_outgoing("Move remote=true from=d7 to=d5".into());
    peer.flush();
    poll_until(|| {
        host.tick(TickInput::default());
        host.game().is_some_and(|g| g.turn() == 3)
    })
    .await;
    let game = host.game().expect("match");
    assert!(game.occupant(sq("e7")).is_some());
    assert!(game.occupant(sq("d7")).is_none());

    peer.disconnect();
    poll_until(|| {
        host.tick(TickInput::default());
        host.game().is_some_and(|g| !g.is_in_progress())
    })
    .await;
    assert_eq!(
        host.game().expect("match").result(),
        Some(MatchResult::Undetermined)
    );
    assert_eq!(host.session().link, Link::Listening);
    assert_eq!(host.session().phase, Phase::Lobby);
    assert!(!host.transport().state().has_peer());

    poll_until(|| {
        watcher.poll_lines();
        watcher.state().link() == Link::Idle
    })
    .await;
}
