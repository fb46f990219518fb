//! Composition root: one bus, every store, the push channel pump, and
//! the HTTP request channel, wired together on a single thread.

use anyhow::Result;
use clap::Parser;
use pb_client::api::ApiClient;
use pb_client::pump::{self, PumpEvent};
use pb_client::router::SubscriptionRouter;
use pb_core::store::{ConnectionStore, LibraryStore, NodeStore, RootGroupStore, RouteStore};
use pb_core::{Event, EventBus};
use std::rc::Rc;
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(name = "patchbay", about = "Client engine for a live server-owned dataflow graph")]
struct Args {
    /// Websocket endpoint of the push channel.
    #[arg(long, default_value = "ws://localhost:7071/ws")]
    ws_url: String,

    /// Base URL of the HTTP request channel.
    #[arg(long, default_value = "http://localhost:7071")]
    api_url: String,

    /// Topic (root group id) to subscribe to on startup.
    #[arg(long, default_value = "default")]
    topic: String,
}

struct Engine {
    bus: Rc<EventBus>,
    nodes: Rc<NodeStore>,
    routes: Rc<RouteStore>,
    connections: Rc<ConnectionStore>,
    root_groups: Rc<RootGroupStore>,
    library: Rc<LibraryStore>,
}

impl Engine {
    /// Registration order is delivery order; routes go before
    /// connections so endpoint normalization sees the routes a
    /// same-burst create refers to.
    fn new() -> Self {
        let bus = Rc::new(EventBus::new());
        let nodes = Rc::new(NodeStore::new());
        let routes = Rc::new(RouteStore::new());
        let connections = Rc::new(ConnectionStore::new(Rc::clone(&routes)));
        let root_groups = Rc::new(RootGroupStore::new());
        let library = Rc::new(LibraryStore::new());

        {
            let nodes = Rc::clone(&nodes);
            bus.register(move |e| nodes.apply(e));
        }
        {
            let routes = Rc::clone(&routes);
            bus.register(move |e| routes.apply(e));
        }
        {
            let connections = Rc::clone(&connections);
            bus.register(move |e| connections.apply(e));
        }
        {
            let root_groups = Rc::clone(&root_groups);
            bus.register(move |e| root_groups.apply(e));
        }
        {
            let library = Rc::clone(&library);
            bus.register(move |e| library.apply(e));
        }

        Self { bus, nodes, routes, connections, root_groups, library }
    }

    fn log_summary(&self) {
        log::debug!(
            "graph: {} nodes, {} routes, {} edges, {} root groups, {} library types",
            self.nodes.len(),
            self.routes.len(),
            self.connections.len(),
            self.root_groups.len(),
            self.library.len(),
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let engine = Engine::new();

    let api = ApiClient::new(&args.api_url);
    let catalog = api.library().await?;
    log::info!("library: {} block types", catalog.len());
    engine.bus.dispatch(&Event::LibraryLoaded(catalog));

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    tokio::spawn(pump::run(args.ws_url.clone(), outbound_rx, event_tx));

    let mut router = SubscriptionRouter::new(Rc::clone(&engine.bus));
    while let Some(event) = event_rx.recv().await {
        match event {
            PumpEvent::Connected => {
                log::info!("push channel up; subscribing to {:?}", args.topic);
                let frames = if router.topic().is_none() {
                    router.request_subscribe(&args.topic)
                } else {
                    // The server dropped our subscription with the
                    // connection; re-subscribe and take the fresh
                    // snapshot over whatever went stale meanwhile.
                    router.resubscribe()
                };
                for frame in frames {
                    outbound_tx.send(frame.to_json()?)?;
                }
            }
            PumpEvent::Frame(text) => router.handle_frame(&text),
            PumpEvent::Disconnected => {
                log::info!("push channel lost; reconnecting");
                engine.log_summary();
            }
        }
    }
    Ok(())
}
