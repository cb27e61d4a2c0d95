//! Sort keys accepted by the server list.
//!
//! The column set is closed: a `sort=field:direction` value naming anything
//! else is rejected instead of being handed to the query.

/// Sortable server columns, by their wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    IpAddress,
    Environment,
    Os,
    Role,
    Location,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    const ALL: [Self; 8] = [
        Self::Name,
        Self::IpAddress,
        Self::Environment,
        Self::Os,
        Self::Role,
        Self::Location,
        Self::CreatedAt,
        Self::UpdatedAt,
    ];

    /// Name used in the `sort` query parameter.
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::IpAddress => "ipAddress",
            Self::Environment => "environment",
            Self::Os => "os",
            Self::Role => "role",
            Self::Location => "location",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
        }
    }

    /// Column in the `servers` table.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::IpAddress => "ip_address",
            Self::Environment => "environment",
            Self::Os => "os",
            Self::Role => "role",
            Self::Location => "location",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.wire_name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A parsed `field:direction` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for ServerSort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Asc,
        }
    }
}

impl ServerSort {
    /// `ORDER BY` body, with `id` as the final tiebreaker so offset pages
    /// slice a total order.
    pub fn order_by(&self) -> String {
        format!("{} {}, id ASC", self.field.column(), self.direction.sql())
    }
}

impl std::str::FromStr for ServerSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s.split_once(':').unwrap_or((s, ""));
        let field = SortField::from_wire(field.trim()).ok_or_else(|| {
            let allowed: Vec<&str> = SortField::ALL.iter().map(SortField::wire_name).collect();
            format!(
                "Unknown sort field: {field}. Expected one of: {}",
                allowed.join(", ")
            )
        })?;
        let direction = match direction.trim().to_ascii_lowercase().as_str() {
            "" | "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => return Err(format!("Unknown sort direction: {other}. Expected asc or desc")),
        };
        Ok(Self { field, direction })
    }
}
