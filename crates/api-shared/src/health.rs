use crate::dto::HealthRes;

/// Health reporting shared by every medforms binary.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Static health check; no instance required.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "medforms is alive".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_healthy() {
        let res = HealthService::check_health();
        assert!(res.ok);
        assert!(res.message.contains("alive"));
    }
}
