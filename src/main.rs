#![deny(clippy::all)]

use log::*;
use sonar::config::{load_config, Config};
use sonar::net::SecurityContext;

/// Properties file used when none is given
const DEFAULT_CONFIG: &str = "sonar.properties";

fn setup_logger() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", concat!(env!("CARGO_PKG_NAME"), "=debug"));
    }
    env_logger::init();
}

fn print_help() {
    println!("sonar v{}", env!("CARGO_PKG_VERSION"));
    println!("SONAR protocol engine: checks a TLS configuration for SONAR sessions\n");
    println!("USAGE:");
    println!("    sonar [OPTIONS] [PROPERTIES_FILE]\n");
    println!("OPTIONS:");
    println!("    -h, --help           Show this help message\n");
    println!("ARGUMENTS:");
    println!("    [PROPERTIES_FILE]    Path to properties file (default: {DEFAULT_CONFIG})\n");
    println!("PROPERTIES:");
    println!("  sonar.protocols = TLSv1\\.[23]        # Enabled protocols (regex, full match)");
    println!("  sonar.cipher.suites = .*_AES_256_.*  # Enabled cipher suites (regex, full match)");
    println!("  keystore.file = keystore.pem         # PEM certificate chain and private key");
    println!("  keystore.password =                  # Ignored for PEM keystores");
    println!("  sonar.host = localhost               # Server host (client side)");
    println!("  sonar.port = 1037                    # Server port (client side)\n");
    println!("EXAMPLES:");
    println!("    sonar                                # Use default sonar.properties");
    println!("    sonar /etc/iris/iris-server.properties");
}

fn run(path: &str) -> Result<(), sonar::common::ConfigurationError> {
    let cfg: Config = load_config(path)?;
    info!("config loaded from {}", path);
    let ctx = SecurityContext::new(&cfg)?;
    info!(
        "security context ready: {} protocols, {} cipher suites",
        ctx.protocols().len(),
        ctx.cipher_suites().len()
    );
    match cfg.client.address() {
        Ok(addr) => info!("server address: {}", addr),
        Err(e) => debug!("no server address: {}", e),
    }
    Ok(())
}

fn main() {
    let path = match std::env::args().nth(1) {
        Some(arg) if arg == "-h" || arg == "--help" => {
            print_help();
            return;
        }
        Some(arg) => arg,
        None => DEFAULT_CONFIG.to_string(),
    };
    setup_logger();
    if let Err(e) = run(&path) {
        error!("{}", e);
        eprintln!("sonar: {}", e);
        std::process::exit(1);
    }
}
