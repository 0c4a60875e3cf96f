fn main() {
    if let Err(err) = calsync_auth_lib::run() {
        eprintln!("calsync-auth: {err}");
        std::process::exit(1);
    }
}
