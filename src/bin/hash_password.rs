//! Helper binary to generate bcrypt password digests for manual user
//! seeding:
//!
//! ```sql
//! INSERT INTO users (username, email, password_hash)
//! VALUES ('alice', 'alice@example.com', '<digest>');
//! ```

use std::io::{self, BufRead, Write};

use taskboard::auth::password::hash_password;

fn main() -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("Password Hash Generator");
    println!("{}", "=".repeat(50));

    loop {
        print!("Enter password (Ctrl-D to exit): ");
        stdout.flush()?;

        let mut password = String::new();
        if stdin.lock().read_line(&mut password)? == 0 {
            println!("\nExiting...");
            return Ok(());
        }

        let password = password.trim_end_matches(['\r', '\n']);
        match hash_password(password) {
            Ok(digest) => {
                println!("\nPassword hash:\n{}\n", digest);
                println!("{}", "=".repeat(50));
            }
            Err(e) => println!("Rejected: {}", e),
        }
    }
}
