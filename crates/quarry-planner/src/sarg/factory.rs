//! Construction of sargable expressions under an optimizer configuration

use crate::sarg::endpoint::{BoundRole, Coordinate, Endpoint, SargDomain, Strictness};
use crate::sarg::interval_expr::SargIntervalBuilder;
use quarry_common::{NullSemantics, SargConfig};

#[derive(Debug, Clone, Default)]
pub struct SargFactory {
    config: SargConfig,
}

impl SargFactory {
    pub fn new(config: SargConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SargConfig {
        &self.config
    }

    /// Unconstrained interval builder with the configured null semantics.
    pub fn interval_builder(&self, domain: SargDomain) -> SargIntervalBuilder {
        self.interval_builder_with(domain, self.config.default_null_semantics)
    }

    pub fn interval_builder_with(
        &self,
        domain: SargDomain,
        null_semantics: NullSemantics,
    ) -> SargIntervalBuilder {
        SargIntervalBuilder::new(domain, null_semantics, self.config.round_integral_coordinates)
    }

    /// Finite endpoint, rounded to the domain when configured to.
    pub fn endpoint(
        &self,
        domain: &SargDomain,
        role: BoundRole,
        strictness: Strictness,
        coordinate: impl Into<Coordinate>,
    ) -> Endpoint {
        if self.config.round_integral_coordinates {
            Endpoint::rounded(domain, role, strictness, coordinate)
        } else {
            Endpoint::finite(role, strictness, coordinate)
        }
    }
}
