//! Built-in station metadata schemas

use schemata_core::{Field, Registry, Schema, SchemaError};

/// Registry holding the built-in schemas under `prefix`
///
/// `Response` has no fields of its own and serves as the common base of
/// `Gain` and `PolesAndZeros`, so a channel may carry either.
pub fn builtin(prefix: &str) -> Result<Registry, SchemaError> {
    let mut registry = Registry::new(prefix);

    let response = registry.declare(Schema::builder("Response"))?;

    registry.declare(
        Schema::builder("Gain")
            .extends(&response)
            .field("gain", Field::float()),
    )?;

    registry.declare(
        Schema::builder("PolesAndZeros")
            .extends(&response)
            .field("constant", Field::float().with_default(1.0))
            .field("poles", Field::list(Field::float()))
            .field("zeros", Field::list(Field::float())),
    )?;

    let channel = registry.declare(
        Schema::builder("Channel")
            .field("channel", Field::string().with_default(""))
            .field("azimuth", Field::float().optional())
            .field("dip", Field::float().optional())
            .field("response", response.t().optional()),
    )?;

    registry.declare(
        Schema::builder("Station")
            .field("network", Field::string().with_default(""))
            .field("station", Field::string().with_default(""))
            .field("location", Field::string().with_default(""))
            .field("lat", Field::float().with_default(0.0))
            .field("lon", Field::float().with_default(0.0))
            .field("elevation", Field::float().with_default(0.0))
            .field("depth", Field::float().with_default(0.0))
            .field("channels", Field::list(channel.t())),
    )?;

    // Six independent components mnn, mee, mdd, mne, mnd, med
    registry.declare(
        Schema::builder("MomentTensor")
            .field("time", Field::timestamp().optional())
            .field("m6", Field::tuple(6, Field::float())),
    )?;

    tracing::debug!(prefix, schemas = registry.len(), "built-in catalog registered");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemata_core::Object;

    #[test]
    fn registration_order() {
        let registry = builtin("schemata").unwrap();
        let tags: Vec<&str> = registry.iter().map(|(tag, _)| tag).collect();
        assert_eq!(
            tags,
            vec![
                "schemata.Response",
                "schemata.Gain",
                "schemata.PolesAndZeros",
                "schemata.Channel",
                "schemata.Station",
                "schemata.MomentTensor",
            ]
        );
    }

    #[test]
    fn station_defaults() {
        let registry = builtin("schemata").unwrap();
        let station = registry.lookup("schemata.Station").unwrap();
        let obj = Object::with_defaults(station).unwrap();
        assert!(obj.check(false).is_ok());
    }

    #[test]
    fn gain_is_a_response() {
        let registry = builtin("x").unwrap();
        let response = registry.lookup("x.Response").unwrap();
        let gain = registry.lookup("x.Gain").unwrap();
        assert!(gain.is_a(response));
        assert!(!response.is_a(gain));
    }
}
