//! smart-snmpd: a small SNMP agent serving the system group.
//!
//! Answers SNMP requests over UDP and, with `--agentx`, also serves the same
//! objects to an AgentX master.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use smart_snmp::agent::{Agent, ViewTable};
use smart_snmp::mib::Mib;
use smart_snmp::transport::{AgentxClient, UdpServer, share};
use smart_snmp::{OidTable, RequestKind, Resolved, SetResult, Value, oid};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// SNMP agent with an optional AgentX sub-agent connection.
#[derive(Debug, Parser)]
#[command(name = "smart-snmpd", version, about)]
struct Args {
    /// Address to listen on for SNMP requests.
    #[arg(long, default_value = "0.0.0.0:161")]
    bind: SocketAddr,

    /// Community granted read-write access to the whole tree. Repeatable.
    #[arg(long, value_name = "NAME", default_value = "public")]
    community: Vec<String>,

    /// AgentX master to register the system group with.
    #[arg(long, value_name = "ADDR")]
    agentx: Option<SocketAddr>,

    /// sysDescr.0 and AgentX session description.
    #[arg(long, default_value = "smart-snmp agent")]
    descr: String,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "smart_snmp=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Register a single `.0` instance under `1.3.6.1.2.1.1.<arc>`.
fn scalar(mib: &mut Mib, arc: u32, value: Value) -> smart_snmp::Result<()> {
    let mut table = OidTable::new();
    table.insert(oid!(0), value);
    mib.register(&oid!(1, 3, 6, 1, 2, 1, 1, arc), table)?;
    Ok(())
}

fn system_group(descr: &str) -> smart_snmp::Result<Mib> {
    let mut mib = Mib::new();
    scalar(&mut mib, 1, Value::from(descr))?;
    scalar(&mut mib, 2, Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 8072, 3, 2, 10)))?;

    let start = Instant::now();
    mib.register(
        &oid!(1, 3, 6, 1, 2, 1, 1, 3),
        move |kind: RequestKind, suffix: &[u32], _: Option<&Value>| {
            let uptime = Value::TimeTicks((start.elapsed().as_millis() / 10) as u32);
            match (kind, suffix) {
                (RequestKind::Get, [0]) => Resolved::value(uptime),
                (RequestKind::Get, _) => Resolved::no_such_instance(),
                (RequestKind::GetNext, []) => Resolved::next(oid!(0), uptime),
                (RequestKind::GetNext, _) => Resolved::end_of_view(),
                (RequestKind::Set, _) => SetResult::NotWritable.into(),
            }
        },
    )?;

    scalar(&mut mib, 4, Value::from(""))?;
    let hostname = std::env::var("HOSTNAME").unwrap_or_default();
    scalar(&mut mib, 5, Value::from(hostname))?;
    scalar(&mut mib, 6, Value::from(""))?;
    Ok(mib)
}

async fn run(args: Args) -> smart_snmp::Result<()> {
    let mut views = ViewTable::new();
    for community in &args.community {
        views = views.community(community.clone(), [oid!(1, 3, 6, 1)], [oid!(1, 3, 6, 1)]);
    }
    let agent = share(
        Agent::builder()
            .views(views)
            .mib(system_group(&args.descr)?)
            .build(),
    );

    let cancel = CancellationToken::new();
    let server = UdpServer::bind(args.bind, None).await?;

    let subagent = args.agentx.map(|master| {
        let client = AgentxClient::new(master)
            .id(oid!(1, 3, 6, 1, 4, 1, 8072, 3, 2, 10))
            .descr(args.descr.clone())
            .subtree(oid!(1, 3, 6, 1, 2, 1, 1))
            .ping_interval(Duration::from_secs(30));
        let agent = agent.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = client.run(agent, cancel).await {
                tracing::error!(target: "smart_snmp::transport", error = %e, "AgentX session ended");
            }
        })
    });

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    let result = server.run(agent, cancel.clone()).await;
    cancel.cancel();
    if let Some(task) = subagent {
        let _ = task.await;
    }
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
