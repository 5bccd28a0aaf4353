//! Look up user 1, then greet them by name.
//!
//! ```sh
//! cargo run -p trpc --example hello-client
//! ```

use std::time::Duration;

use trpc::peer::Client;
use trpc::service::CallContext;
use trpc::services::hello::{HelloClient, HelloRequest};
use trpc::services::user::{UserClient, UserRequest};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut client = Client::connect("tcp", "127.0.0.1:50051")?;

    let ctx = CallContext::background().with_timeout(Duration::from_secs(1));
    let user = UserClient::new(&mut client)
        .user(&ctx, &UserRequest { uid: 1 })?
        .user;
    println!("user: {user:?}");

    let ctx = CallContext::background().with_timeout(Duration::from_secs(1));
    let reply = HelloClient::new(&mut client).hello(&ctx, &HelloRequest::new(user.name))?;
    println!("reply: {}", reply.msg);

    client.close()?;
    Ok(())
}
