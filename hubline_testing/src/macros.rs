//! Assertion macros shared by integration tests.

/// Await a connection future and panic with contextual diagnostics on
/// failure.
#[macro_export]
macro_rules! hub_expect {
    ($fut:expr) => {{
        $fut.await
            .expect(concat!("hub operation failed at ", file!(), ":", line!()))
    }};
    ($fut:expr, $msg:expr) => {{
        let m = ::std::format!("{msg} at {}:{}", file!(), line!(), msg = $msg);
        $fut.await.expect(&m)
    }};
}
