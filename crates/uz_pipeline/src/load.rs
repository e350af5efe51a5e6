//! LOAD stage: inputs from disk plus derived parcel attributes.

use std::path::Path;

use tracing::debug;

use uz_algo::{classify_owner_type, classify_property_type};
use uz_core::parcel::Parcel;
use uz_io::loader::{self, LoadedContext};

use crate::PipelineError;

/// Fill `owner_type` from `owner_name` and `property_type` from `property_class`
/// when upstream left them empty. Returns how many parcels were touched.
pub fn enrich_parcels(parcels: &mut [Parcel]) -> usize {
    let mut touched = 0;
    for p in parcels.iter_mut() {
        let mut changed = false;
        if p.owner_type.is_none() {
            if let Some(name) = p.owner_name.as_deref() {
                p.owner_type = Some(classify_owner_type(name));
                changed = true;
            }
        }
        if p.property_type.is_none() {
            if let Some(class) = p.property_class.as_deref() {
                p.property_type = Some(classify_property_type(class).as_str().to_string());
                changed = true;
            }
        }
        touched += usize::from(changed);
    }
    debug!(touched, "parcel attributes derived");
    touched
}

pub fn load_from_manifest(path: &Path) -> Result<LoadedContext, PipelineError> {
    Ok(loader::load_all_from_manifest(path)?)
}

pub fn load_from_paths(parcels: &Path, policies: &Path) -> Result<LoadedContext, PipelineError> {
    Ok(loader::load_all(parcels, policies)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uz_core::parcel::OwnerType;

    #[test]
    fn derives_missing_attributes_only() {
        let mut a = Parcel::new("A".parse().unwrap());
        a.owner_name = Some("Denver Public Schools".into());
        a.property_class = Some("VACANT LAND".into());
        let mut b = Parcel::new("B".parse().unwrap());
        b.owner_name = Some("City and County of Denver".into());
        b.owner_type = Some(OwnerType::Private);
        let c = Parcel::new("C".parse().unwrap());

        let mut ps = vec![a, b, c];
        assert_eq!(enrich_parcels(&mut ps), 1);
        assert_eq!(ps[0].owner_type, Some(OwnerType::School));
        assert_eq!(ps[0].property_type.as_deref(), Some("vacant"));
        assert_eq!(ps[1].owner_type, Some(OwnerType::Private));
        assert_eq!(ps[2].owner_type, None);
    }
}
