use serde::Serialize;
use utoipa::ToSchema;

/// One entry of the fixed analysis catalog offered to operators.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Algorithm {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const AVAILABLE_ALGORITHMS: [Algorithm; 4] = [
    Algorithm {
        id: "agriculture_classification",
        name: "Agricultural land classification",
        description: "Automatic classification of agricultural land-use types",
    },
    Algorithm {
        id: "vegetation_index",
        name: "Vegetation index computation",
        description: "NDVI, EVI and other vegetation indices",
    },
    Algorithm {
        id: "object_detection",
        name: "Object detection",
        description: "Detection and classification of objects in aerial imagery",
    },
    Algorithm {
        id: "change_detection",
        name: "Change detection",
        description: "Changes between imagery captured at different times",
    },
];

pub fn find_algorithm(id: &str) -> Option<&'static Algorithm> {
    AVAILABLE_ALGORITHMS.iter().find(|a| a.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lookup() {
        assert_eq!(
            find_algorithm("vegetation_index").map(|a| a.name),
            Some("Vegetation index computation")
        );
        assert!(find_algorithm("terrain_modelling").is_none());
    }
}
