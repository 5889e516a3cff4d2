//! Navigation Signals
//!
//! Fire-and-forget requests to the host router.

use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Default destination after login
    Dashboard,
    /// Landing destination after logout
    Login,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/dashboard",
            Route::Login => "/login",
        }
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Forwards routes to a router task; a closed channel drops the signal.
impl Navigator for UnboundedSender<Route> {
    fn navigate(&self, route: Route) {
        if self.send(route).is_err() {
            log::debug!("navigation to {} dropped, router is gone", route.path());
        }
    }
}

/// Navigator for headless hosts
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: Route) {
        log::info!("navigate -> {}", route.path());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_channel_navigator() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.navigate(Route::Dashboard);
        tx.navigate(Route::Login);

        assert_eq!(rx.try_recv().unwrap(), Route::Dashboard);
        assert_eq!(rx.try_recv().unwrap(), Route::Login);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel::<Route>();
        drop(rx);
        tx.navigate(Route::Login);
    }
}
