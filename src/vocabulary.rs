//! Static Schema.org vocabulary rules.
//!
//! Two questions get answered here, both for the geo-placement decision in
//! the orchestrator:
//!
//! 1. Does a declared type inherently carry the `geo` property?
//!    (`Place` and its subtypes do.)
//! 2. Is a given property name a valid placeholder for a nested
//!    `Place`-typed value? (e.g. `contentLocation` on a `CreativeWork`.)
//!
//! The tables are process-wide, read-only and built at compile time. Unknown
//! type or property names answer `false`; the permissive default is handled
//! as a warning path upstream, never a hard failure.

/// Recognized types mapped to the property names that may hold a nested
/// `Place` value. Types carrying `geo` directly list it among their
/// properties. Sorted by type name for binary search.
const TYPE_PROPERTIES: &[(&str, &[&str])] = &[
    ("Accommodation", PLACE_SUBTYPE_PROPERTIES),
    ("Action", &["location"]),
    ("AdministrativeArea", PLACE_SUBTYPE_PROPERTIES),
    ("Airport", PLACE_SUBTYPE_PROPERTIES),
    ("Aquarium", PLACE_SUBTYPE_PROPERTIES),
    ("Article", CREATIVE_WORK_PROPERTIES),
    ("AudioObject", MEDIA_OBJECT_PROPERTIES),
    ("Beach", PLACE_SUBTYPE_PROPERTIES),
    ("Blog", CREATIVE_WORK_PROPERTIES),
    ("Book", CREATIVE_WORK_PROPERTIES),
    ("Bridge", PLACE_SUBTYPE_PROPERTIES),
    ("BusStation", PLACE_SUBTYPE_PROPERTIES),
    ("BusStop", PLACE_SUBTYPE_PROPERTIES),
    ("Campground", PLACE_SUBTYPE_PROPERTIES),
    ("Cemetery", PLACE_SUBTYPE_PROPERTIES),
    ("City", PLACE_SUBTYPE_PROPERTIES),
    ("CivicStructure", PLACE_SUBTYPE_PROPERTIES),
    ("Clip", CREATIVE_WORK_PROPERTIES),
    ("Comment", CREATIVE_WORK_PROPERTIES),
    ("ContactPoint", &["areaServed"]),
    ("Conversation", CREATIVE_WORK_PROPERTIES),
    ("Country", PLACE_SUBTYPE_PROPERTIES),
    ("CreativeWork", CREATIVE_WORK_PROPERTIES),
    ("CreativeWorkSeason", CREATIVE_WORK_PROPERTIES),
    ("CreativeWorkSeries", CREATIVE_WORK_PROPERTIES),
    ("DataCatalog", CREATIVE_WORK_PROPERTIES),
    ("Dataset", CREATIVE_WORK_PROPERTIES),
    ("Demand", OFFER_PROPERTIES),
    ("DigitalDocument", CREATIVE_WORK_PROPERTIES),
    ("Episode", CREATIVE_WORK_PROPERTIES),
    ("Event", &["location"]),
    ("ExerciseAction", MOVE_ACTION_PROPERTIES),
    (
        "Game",
        &[
            "contentLocation",
            "gameLocation",
            "locationCreated",
            "spatialCoverage",
        ],
    ),
    ("ImageObject", MEDIA_OBJECT_PROPERTIES),
    ("JobPosting", &["jobLocation"]),
    ("Landform", PLACE_SUBTYPE_PROPERTIES),
    ("LandmarksOrHistoricalBuildings", PLACE_SUBTYPE_PROPERTIES),
    ("LocalBusiness", PLACE_SUBTYPE_PROPERTIES),
    ("Map", CREATIVE_WORK_PROPERTIES),
    ("MediaObject", MEDIA_OBJECT_PROPERTIES),
    ("MoveAction", MOVE_ACTION_PROPERTIES),
    ("Movie", CREATIVE_WORK_PROPERTIES),
    ("MusicComposition", CREATIVE_WORK_PROPERTIES),
    ("MusicPlaylist", CREATIVE_WORK_PROPERTIES),
    ("MusicRecording", CREATIVE_WORK_PROPERTIES),
    ("Offer", OFFER_PROPERTIES),
    (
        "Organization",
        &["areaServed", "foundingLocation", "hasPOS", "location"],
    ),
    ("Painting", CREATIVE_WORK_PROPERTIES),
    (
        "Person",
        &[
            "birthPlace",
            "deathPlace",
            "hasPOS",
            "homeLocation",
            "workLocation",
        ],
    ),
    ("Photograph", CREATIVE_WORK_PROPERTIES),
    ("Place", PLACE_SUBTYPE_PROPERTIES),
    ("PublicationIssue", CREATIVE_WORK_PROPERTIES),
    ("PublicationVolume", CREATIVE_WORK_PROPERTIES),
    ("Question", CREATIVE_WORK_PROPERTIES),
    ("Recipe", CREATIVE_WORK_PROPERTIES),
    ("RentalCarReservation", &["dropoffLocation", "pickupLocation"]),
    ("Residence", PLACE_SUBTYPE_PROPERTIES),
    ("Review", CREATIVE_WORK_PROPERTIES),
    ("Sculpture", CREATIVE_WORK_PROPERTIES),
    ("Series", CREATIVE_WORK_PROPERTIES),
    ("Service", &["areaServed"]),
    ("ServiceChannel", &["serviceLocation"]),
    ("SoftwareApplication", CREATIVE_WORK_PROPERTIES),
    ("SoftwareSourceCode", CREATIVE_WORK_PROPERTIES),
    ("State", PLACE_SUBTYPE_PROPERTIES),
    ("TVSeason", CREATIVE_WORK_PROPERTIES),
    ("TVSeries", CREATIVE_WORK_PROPERTIES),
    ("TouristAttraction", PLACE_SUBTYPE_PROPERTIES),
    ("TransferAction", MOVE_ACTION_PROPERTIES),
    ("VisualArtwork", CREATIVE_WORK_PROPERTIES),
    ("WebPage", CREATIVE_WORK_PROPERTIES),
    ("WebSite", CREATIVE_WORK_PROPERTIES),
];

const PLACE_SUBTYPE_PROPERTIES: &[&str] = &["containedInPlace", "containsPlace", "geo"];

const CREATIVE_WORK_PROPERTIES: &[&str] =
    &["contentLocation", "locationCreated", "spatialCoverage"];

const MEDIA_OBJECT_PROPERTIES: &[&str] = &[
    "contentLocation",
    "locationCreated",
    "regionsAllowed",
    "spatialCoverage",
];

const MOVE_ACTION_PROPERTIES: &[&str] = &["fromLocation", "toLocation"];

const OFFER_PROPERTIES: &[&str] = &[
    "areaServed",
    "availableAtOrFrom",
    "eligibleRegion",
    "ineligibleRegion",
];

/// Union of all place-valued property names across the catalog, sorted.
const PLACE_PROPERTIES: &[&str] = &[
    "areaServed",
    "availableAtOrFrom",
    "birthPlace",
    "containedInPlace",
    "containsPlace",
    "contentLocation",
    "deathPlace",
    "dropoffLocation",
    "eligibleRegion",
    "foundingLocation",
    "fromLocation",
    "gameLocation",
    "geo",
    "hasPOS",
    "homeLocation",
    "ineligibleRegion",
    "jobLocation",
    "location",
    "locationCreated",
    "pickupLocation",
    "regionsAllowed",
    "serviceLocation",
    "spatialCoverage",
    "toLocation",
    "workLocation",
];

/// True iff the declared type inherently carries the `geo` property, i.e. it
/// is `Place` or one of its subtypes. Geometry indicators for such a type
/// attach directly under the geo property node, without a Place wrapper.
pub fn has_geo_property(type_name: &str) -> bool {
    place_properties(type_name)
        .map(|props| props.binary_search(&"geo").is_ok())
        .unwrap_or(false)
}

/// True iff the property name is a recognized placeholder expecting a nested
/// `Place`-typed value. Unknown names return false.
pub fn is_valid_place_property(property_name: &str) -> bool {
    PLACE_PROPERTIES.binary_search(&property_name).is_ok()
}

/// Place-valued property names a recognized type declares, if any.
pub fn place_properties(type_name: &str) -> Option<&'static [&'static str]> {
    TYPE_PROPERTIES
        .binary_search_by_key(&type_name, |(name, _)| name)
        .ok()
        .map(|i| TYPE_PROPERTIES[i].1)
}

/// All recognized type names, in sorted order.
pub fn known_types() -> impl Iterator<Item = &'static str> {
    TYPE_PROPERTIES.iter().map(|(name, _)| *name)
}
