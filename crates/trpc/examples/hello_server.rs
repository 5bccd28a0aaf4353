//! Serve the greeting and user services on :50051.
//!
//! ```sh
//! cargo run -p trpc --example hello-server
//! ```

use trpc::peer::Server;
use trpc::services::hello::{register_hello_server, Greeter};
use trpc::services::user::{register_user_server, UserDirectory};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = Server::bind("tcp", "0.0.0.0:50051")?;
    register_hello_server(&mut server, Greeter);
    register_user_server(&mut server, UserDirectory::sample());

    println!("serving on {}", server.local_addr());
    server.serve()?;
    Ok(())
}
