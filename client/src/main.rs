use std::path::Path;

use pinball_client::boardfile::load_board_file;
use pinball_client::config::ClientConfig;
use pinball_client::input::{InputSource, KeyEvent, LineInput};
use pinball_client::render::{BoardRenderer, TextRenderer};
use pinball_client::session;
use pinball_shared::protocol::{ClientMessage, RelayMessage, Wall};

const FRAME_BUDGET_SECS: f64 = 0.020;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match ClientConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("pinball-client: {err}");
            std::process::exit(1);
        }
    };

    let (mut board, bindings) = match load_board_file(Path::new(&config.file)) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("pinball-client: failed to load {}: {err}", config.file);
            std::process::exit(1);
        }
    };

    let mut relay = None;
    if let Some(host) = &config.host {
        match session::connect(host, config.port, board.name()).await {
            Ok(pair) => relay = Some(pair),
            Err(err) => {
                tracing::warn!("could not reach relay at {host}:{}: {err}; continuing standalone", config.port);
            }
        }
    }

    let mut renderer = TextRenderer::default();
    let mut input = LineInput::spawn();
    let mut ticker = tokio::time::interval(tokio::time::Duration::from_secs_f64(FRAME_BUDGET_SECS));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if let Some((session, _)) = relay.as_ref() {
                    session.send(ClientMessage::Quit);
                }
                tracing::info!("shutting down");
                return;
            }
            _ = ticker.tick() => {}
        }

        if let Some((_, incoming)) = relay.as_mut() {
            while let Ok(message) = incoming.try_recv() {
                apply_relay_message(&mut board, message);
            }
        }

        for event in input.poll() {
            let (key, is_down) = match event {
                KeyEvent::Down(key) => (key, true),
                KeyEvent::Up(key) => (key, false),
            };
            let action = if is_down { bindings.action_for_keydown(&key) } else { bindings.action_for_keyup(&key) };
            if let Some(action) = action {
                board.trigger_by_name(action);
            }
        }

        let outgoing = board.step(FRAME_BUDGET_SECS);
        if let Some((session, _)) = relay.as_ref() {
            for message in outgoing {
                session.send(message);
            }
        }

        renderer.render(&board.snapshot());
    }
}

fn apply_relay_message(board: &mut pinball_engine::Board, message: RelayMessage) {
    match message {
        RelayMessage::GetClientBoardName => {}
        RelayMessage::AllConnectedBoards(boards) => {
            tracing::debug!("connected boards: {boards:?}");
        }
        RelayMessage::JoinHorizontal { left, right } => apply_join(board, &left, &right, Wall::Right, Wall::Left),
        RelayMessage::JoinVertical { top, bottom } => apply_join(board, &top, &bottom, Wall::Bottom, Wall::Top),
        RelayMessage::DisconnectWall { board_name, wall } => {
            let local_wall = wall.opposite();
            if board.join_state().get(&local_wall).and_then(|r| r.as_ref()) == Some(&board_name) {
                board.apply_wall_join(local_wall, None);
            }
        }
        RelayMessage::TeleportPortal { dest_board: _, ball_name, velocity, portal_name } => {
            board.inject_ball_from_portal(&portal_name, ball_name, velocity);
        }
        RelayMessage::TeleportWall { dest_board: _, ball_name, velocity, position, wall } => {
            board.inject_ball_from_wall(ball_name, velocity, position, wall);
        }
        RelayMessage::ConnectPortal { portal_name } => board.set_portal_connected(&portal_name, true),
        RelayMessage::DisconnectPortal { portal_name } => board.set_portal_connected(&portal_name, false),
        RelayMessage::Failure => tracing::warn!("relay reported a failure for our last request"),
    }
}

/// `JoinHorizontal`/`JoinVertical` name both parties; this board applies
/// whichever side matches its own name to its own wall.
fn apply_join(board: &mut pinball_engine::Board, first: &str, second: &str, wall_if_first: Wall, wall_if_second: Wall) {
    if board.name() == first {
        board.apply_wall_join(wall_if_first, Some(second.to_string()));
    } else if board.name() == second {
        board.apply_wall_join(wall_if_second, Some(first.to_string()));
    }
}
