use warp::Filter;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::{task};
use crate::state;

pub fn set_up_web_server(
  state: Arc<Mutex<state::State>>,
  restart: mpsc::Sender<()>,
  listen: SocketAddr,
) -> task::JoinHandle<()> {
  let state_filter = warp::any().map(move || state.clone());
  let restart_filter = warp::any().map(move || restart.clone());

  let index_route = warp::get()
      .and(warp::path::end())
      .and(state_filter.clone())
      .map(render_index);
  let json_route = warp::get()
      .and(warp::path!("json"))
      .and(warp::path::end())
      .and(state_filter)
      .and_then(get_status);
  let reset_route = warp::get()
      .and(warp::path!("reset"))
      .and(warp::path::end())
      .and(restart_filter)
      .and_then(request_reset);

  task :: spawn(async move {
      warp::serve(index_route.or(json_route).or(reset_route))
      .run(listen)
      .await;
  })
}

fn render_index(state: Arc<Mutex<state::State>>) -> impl warp::Reply {
  let snapshot = state.lock().unwrap().snapshot();
  let temperature = match snapshot.temperature {
    Some(value) => format!("{:.2}", value),
    None => "--".to_string(),
  };
  warp::reply::html(format!(
    "<!DOCTYPE html><html>\
     <head><title>{device}</title></head>\
     <body><h1>{device}</h1>\
     <p>Temperature: {temperature} &deg;{unit}</p>\
     <p>Target: {target:.2} &deg;{unit}</p>\
     <p>Compressor relay: {relay}</p>\
     </body></html>",
    device = snapshot.device,
    temperature = temperature,
    unit = snapshot.unit,
    target = snapshot.target,
    relay = snapshot.relay,
  ))
}

async fn get_status(state: Arc<Mutex<state::State>>) -> Result<impl warp::Reply, warp::Rejection> {
  let state_unlocked = state.lock().unwrap();
  Ok(warp::reply::json(
    &state_unlocked.snapshot()
  ))
}

async fn request_reset(restart: mpsc::Sender<()>) -> Result<impl warp::Reply, warp::Rejection> {
  log::info!("reset requested over http");
  // a full channel means a reset is already pending
  let _ = restart.try_send(());
  Ok("resetting\n")
}
