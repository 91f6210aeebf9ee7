use log::info;
use structopt::StructOpt;

use sflow_collector::collector::Collector;
use sflow_collector::config::Opts;
use sflow_collector::logger;
use sflow_collector::snapshotter::Snapshotter;
use sflow_collector::topology::ControllerClient;

fn main() -> std::io::Result<()> {
    let opts = Opts::from_args();

    logger::init(&opts.log_level);
    info!("Starting App");

    let collector = Collector::with_sampling_rate(opts.listener, opts.buffer_size, opts.tick_interval(), opts.sampling_rate);
    collector.start()?;

    let client = ControllerClient::new(opts.switches_url.clone(), opts.hosts_url.clone(), opts.links_url.clone());
    let snapshotter = Snapshotter::new(client, opts.tick_interval());
    snapshotter.start();

    // Shutdown (signal handling, a supervising process asking both to stop)
    // is left to whatever embeds this core; this binary just runs until
    // killed, as the reference collector did.
    loop {
        std::thread::sleep(std::time::Duration::from_secs(3600));
    }
}
