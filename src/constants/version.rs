use semver::Version;

pub fn get_version() -> String {
    let semver = env!("CARGO_PKG_VERSION").parse::<Version>();

    if let Ok(semver) = semver {
        // vergen falls back to this placeholder when the build has no git checkout.
        if env!("VERGEN_GIT_SHA") == "VERGEN_IDEMPOTENT_OUTPUT" {
            semver.to_string()
        } else {
            let sha = env!("VERGEN_GIT_SHA");

            format!("{} (`{}`)", semver, &sha[..sha.len().min(7)])
        }
    } else {
        tracing::warn!("couldn't parse a semver out of Cargo.toml? defaulting to 0.0.0-unknown.");
        String::from("0.0.0-unknown")
    }
}
