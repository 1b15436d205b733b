pub const FULL: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "+git.",
    env!("RUNLEDGER_GIT_COUNT"),
    ".",
    env!("RUNLEDGER_GIT_SHA"),
    env!("RUNLEDGER_GIT_DIRTY")
);
