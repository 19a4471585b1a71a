//! Built-in schema descriptors for every admin entity

use once_cell::sync::Lazy;

use super::{
    ColumnRule, EntitySchema, EnumOption, FieldDef, FieldKind, FileUpload, ImportColumn,
    ImportSpec, ReferenceKind,
};

static REGISTRY: Lazy<Vec<EntitySchema>> = Lazy::new(builtin_schemas);

/// All known entity schemas, in menu order
pub fn all_schemas() -> &'static [EntitySchema] {
    &REGISTRY
}

/// Find a schema by its command-line key, endpoint, or label (case-insensitive)
pub fn find_schema(name: &str) -> Option<&'static EntitySchema> {
    let name = name.trim().to_lowercase();
    REGISTRY.iter().find(|s| {
        s.key == name || s.endpoint.to_lowercase() == name || s.label.to_lowercase() == name
    })
}

pub fn schema_keys() -> Vec<&'static str> {
    REGISTRY.iter().map(|s| s.key).collect()
}

pub fn ambulance_categories() -> Vec<EnumOption> {
    vec![
        EnumOption::new("type1", "Type 1 - Basic Life Support"),
        EnumOption::new("type2", "Type 2 - Advanced Life Support"),
        EnumOption::new("type3", "Type 3 - Patient Transport"),
    ]
}

pub fn country_categories() -> Vec<EnumOption> {
    [
        "South Eastern Asia",
        "Turkey and Muslims of Europe and America",
        "Arabic Countries",
        "Iran",
        "Non-Arab African Countries",
        "Southern Asia",
    ]
    .into_iter()
    .map(EnumOption::plain)
    .collect()
}

fn plain_options(values: &[&str]) -> Vec<EnumOption> {
    values.iter().map(|v| EnumOption::plain(*v)).collect()
}

fn enum_values(options: &[EnumOption]) -> Vec<String> {
    options.iter().map(|o| o.value.clone()).collect()
}

fn text(name: &'static str, title: &'static str) -> FieldDef {
    FieldDef::new(name, title, FieldKind::Text)
}

fn coords() -> FieldDef {
    FieldDef::new("location", "Location", FieldKind::Coordinates)
}

fn location_ref(name: &'static str) -> FieldDef {
    FieldDef::new(
        name,
        "Location Reference",
        FieldKind::Reference(ReferenceKind::Location),
    )
}

fn branch_ref(name: &'static str) -> FieldDef {
    FieldDef::new(name, "Branch", FieldKind::Reference(ReferenceKind::Branch))
}

fn latitude() -> ImportColumn {
    ImportColumn::optional("latitude", ColumnRule::Latitude, "21.4225")
}

fn longitude() -> ImportColumn {
    ImportColumn::optional("longitude", ColumnRule::Longitude, "39.8262")
}

fn base(key: &'static str, label: &'static str, plural: &'static str, endpoint: &'static str) -> EntitySchema {
    EntitySchema {
        key,
        label,
        plural,
        endpoint,
        fields: Vec::new(),
        search_fields: Vec::new(),
        import: None,
        list_requires_auth: false,
        list_envelope: None,
        bulk_statuses: Vec::new(),
        file_uploads: Vec::new(),
    }
}

fn builtin_schemas() -> Vec<EntitySchema> {
    vec![
        ambulance(),
        branch(),
        building(),
        bus_station(),
        camp(),
        clinic(),
        country(),
        emergency(),
        hospital(),
        location(),
        notification(),
        nusuk(),
        thanima(),
    ]
}

fn ambulance() -> EntitySchema {
    let categories = ambulance_categories();
    let allowed = enum_values(&categories);
    EntitySchema {
        fields: vec![
            FieldDef::new("category", "Category", FieldKind::Enum(categories)),
            text("center", "Center"),
            text("poll", "Poll"),
            coords(),
            location_ref("ref"),
        ],
        search_fields: vec!["category", "center", "ref"],
        import: Some(ImportSpec {
            columns: vec![
                ImportColumn::required("category", ColumnRule::Enum(allowed), "type1"),
                ImportColumn::required("center", ColumnRule::Text, "Center A"),
                ImportColumn::required("poll", ColumnRule::Text, "Poll 1"),
                latitude(),
                longitude(),
                ImportColumn::optional(
                    "branch_name",
                    ColumnRule::Reference(ReferenceKind::Branch),
                    "Branch 1",
                ),
            ],
        }),
        ..base("ambulance", "Ambulance", "ambulances", "ambulance")
    }
}

fn branch() -> EntitySchema {
    EntitySchema {
        fields: vec![text("name", "Name"), location_ref("ref")],
        search_fields: vec!["name", "ref"],
        import: Some(ImportSpec {
            columns: vec![
                ImportColumn::required("name", ColumnRule::Text, "Sample Branch Name"),
                ImportColumn::required(
                    "location_name",
                    ColumnRule::Reference(ReferenceKind::Location),
                    "Sample Location Name",
                ),
            ],
        }),
        ..base("branch", "Branch", "branches", "branch")
    }
}

fn building() -> EntitySchema {
    EntitySchema {
        fields: vec![
            text("name", "Name"),
            coords(),
            text("phone", "Phone"),
            location_ref("ref"),
        ],
        search_fields: vec!["name", "phone", "ref"],
        import: Some(ImportSpec {
            columns: vec![
                ImportColumn::required("name", ColumnRule::Text, "Sample Building"),
                ImportColumn::required("phone", ColumnRule::Text, "1234567890"),
                latitude(),
                longitude(),
                ImportColumn::optional(
                    "location_name",
                    ColumnRule::Reference(ReferenceKind::Location),
                    "Sample Location Name",
                ),
            ],
        }),
        ..base("building", "Building", "buildings", "building")
    }
}

fn bus_station() -> EntitySchema {
    EntitySchema {
        fields: vec![
            text("name", "Name"),
            text("stationPoint", "Station Point"),
            text("link", "Link"),
            text("destinationPoint", "Destination Point"),
            branch_ref("ref"),
            location_ref("locationRef"),
        ],
        search_fields: vec!["name", "stationPoint", "destinationPoint", "ref", "locationRef"],
        import: Some(ImportSpec {
            columns: vec![
                ImportColumn::required("name", ColumnRule::Text, "Sample Bus Station"),
                ImportColumn::optional(
                    "location_name",
                    ColumnRule::Reference(ReferenceKind::Location),
                    "Azizia",
                ),
                ImportColumn::optional(
                    "branch_name",
                    ColumnRule::Reference(ReferenceKind::Branch),
                    "Branch 1",
                ),
                ImportColumn::optional("station_point", ColumnRule::Text, "Sample Station Point"),
                ImportColumn::optional("link", ColumnRule::Text, "https://maps.example.com/location"),
                ImportColumn::optional("destination_point", ColumnRule::Text, "Sample Destination"),
            ],
        }),
        ..base("bus-station", "Bus Station", "bus stations", "busStation")
    }
}

fn camp() -> EntitySchema {
    EntitySchema {
        fields: vec![
            text("maktab", "Maktab"),
            text("zone", "Zone"),
            FieldDef::new("country", "Country", FieldKind::Reference(ReferenceKind::Country)),
            text("poll", "Poll"),
            coords(),
            location_ref("ref"),
        ],
        search_fields: vec!["maktab", "zone", "country", "poll", "ref"],
        import: Some(ImportSpec {
            columns: vec![
                ImportColumn::required("maktab", ColumnRule::Text, "Sample Maktab"),
                ImportColumn::required(
                    "location_name",
                    ColumnRule::Reference(ReferenceKind::Location),
                    "Azizia",
                ),
                ImportColumn::required(
                    "country",
                    ColumnRule::Reference(ReferenceKind::Country),
                    "India",
                ),
                ImportColumn::optional("zone", ColumnRule::Text, "Zone A"),
                ImportColumn::optional("poll", ColumnRule::Text, "Poll 1"),
                latitude(),
                longitude(),
            ],
        }),
        ..base("camp", "Camp", "camps", "camp")
    }
}

fn clinic() -> EntitySchema {
    EntitySchema {
        fields: vec![
            text("name", "Name"),
            text("center", "Center"),
            text("poll", "Poll"),
            coords(),
            location_ref("ref"),
            branch_ref("branchRef"),
        ],
        search_fields: vec!["name", "center", "poll", "ref", "branchRef"],
        import: Some(ImportSpec {
            columns: vec![
                ImportColumn::required("name", ColumnRule::Text, "Sample Clinic"),
                ImportColumn::required(
                    "location_name",
                    ColumnRule::Reference(ReferenceKind::Location),
                    "Azizia",
                ),
                ImportColumn::required(
                    "branch_name",
                    ColumnRule::Reference(ReferenceKind::Branch),
                    "Branch 1",
                ),
                ImportColumn::optional("center", ColumnRule::Text, "Center A"),
                ImportColumn::optional("poll", ColumnRule::Text, "Poll 1"),
                latitude(),
                longitude(),
            ],
        }),
        ..base("clinic", "Clinic", "clinics", "clinic")
    }
}

fn country() -> EntitySchema {
    EntitySchema {
        fields: vec![
            text("name", "Name"),
            text("arabicName", "Arabic Name"),
            text("flag", "Flag"),
            FieldDef::new("category", "Category", FieldKind::Enum(country_categories())),
        ],
        search_fields: vec!["name", "arabicName", "category"],
        file_uploads: vec![FileUpload {
            field: "flag",
            endpoint: "countries/upload-flag",
            part: "flag",
        }],
        ..base("country", "Country", "countries", "countries")
    }
}

fn emergency() -> EntitySchema {
    EntitySchema {
        fields: vec![
            text("name", "Name"),
            text("contact", "Contact"),
            location_ref("ref"),
        ],
        search_fields: vec!["name", "contact", "ref"],
        ..base("emergency", "Emergency Contact", "emergency contacts", "emergency")
    }
}

fn hospital() -> EntitySchema {
    EntitySchema {
        fields: vec![
            text("name", "Name"),
            text("arabicName", "Arabic Name"),
            coords(),
            text("phone", "Phone"),
            location_ref("ref"),
        ],
        search_fields: vec!["name", "arabicName", "phone", "ref"],
        import: Some(ImportSpec {
            columns: vec![
                ImportColumn::required("name", ColumnRule::Text, "Sample Hospital"),
                ImportColumn::required("arabicName", ColumnRule::Text, "مستشفى"),
                ImportColumn::required("phone", ColumnRule::Text, "1234567890"),
                latitude(),
                longitude(),
            ],
        }),
        ..base("hospital", "Hospital", "hospitals", "hospital")
    }
}

fn location() -> EntitySchema {
    EntitySchema {
        fields: vec![text("id", "ID"), text("name", "Name")],
        search_fields: vec!["name", "id"],
        ..base("location", "Location", "locations", "location")
    }
}

fn notification() -> EntitySchema {
    EntitySchema {
        fields: vec![
            text("title", "Title"),
            text("message", "Message"),
            FieldDef::new(
                "type",
                "Type",
                FieldKind::Enum(plain_options(&["info", "warning", "error", "success"])),
            ),
            FieldDef::new(
                "priority",
                "Priority",
                FieldKind::Enum(plain_options(&["low", "medium", "high"])),
            ),
            FieldDef::new(
                "targetUsers",
                "Target Users",
                FieldKind::Enum(vec![
                    EnumOption::new("all", "All Users"),
                    EnumOption::new("admin", "Admins"),
                    EnumOption::new("user", "Regular Users"),
                ]),
            ),
            FieldDef::new("expiresAt", "Expires At", FieldKind::DateTime),
            FieldDef::new(
                "status",
                "Status",
                FieldKind::Enum(plain_options(&["unread", "read", "archived"])),
            ),
        ],
        search_fields: vec!["title", "message", "type", "priority"],
        list_requires_auth: true,
        list_envelope: Some("notifications"),
        bulk_statuses: vec!["read", "archived"],
        ..base("notification", "Notification", "notifications", "notifications")
    }
}

fn nusuk() -> EntitySchema {
    EntitySchema {
        fields: vec![
            text("name", "Name"),
            text("building", "Building"),
            coords(),
            location_ref("ref"),
        ],
        search_fields: vec!["name", "building", "ref"],
        import: Some(ImportSpec {
            columns: vec![
                ImportColumn::required("name", ColumnRule::Text, "Sample Nusuk"),
                ImportColumn::required("building", ColumnRule::Text, "Building A"),
                latitude(),
                longitude(),
                ImportColumn::optional(
                    "location_name",
                    ColumnRule::Reference(ReferenceKind::Location),
                    "Sample Location Name",
                ),
            ],
        }),
        ..base("nusuk", "Nusuk", "nusuks", "nusuk")
    }
}

fn thanima() -> EntitySchema {
    EntitySchema {
        fields: vec![
            text("name", "Name"),
            text("phone", "Phone"),
            text("id", "ID"),
            location_ref("ref"),
        ],
        search_fields: vec!["name", "id", "phone", "ref"],
        import: Some(ImportSpec {
            columns: vec![
                ImportColumn::required("name", ColumnRule::Text, "Sample Thanima"),
                ImportColumn::required("phone", ColumnRule::Text, "1234567890"),
                ImportColumn::required("id", ColumnRule::Text, "101"),
            ],
        }),
        ..base("thanima", "Thanima", "thanimas", "thanima")
    }
}
