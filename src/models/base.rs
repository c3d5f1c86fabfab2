//! Entity schemas composed from reusable column groups.
//!
//! Each group is a plain slice of [`ColumnDef`]s; an [`EntitySchema`] lists the groups
//! it is made of, in column order. The migration binary renders DDL from these.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
    pub primary_key: bool,
    pub indexed: bool,
    /// SQL expression used as the column default.
    pub default: Option<&'static str>,
}

impl ColumnDef {
    pub const fn new(name: &'static str, sql_type: &'static str) -> Self {
        ColumnDef {
            name,
            sql_type,
            nullable: false,
            primary_key: false,
            indexed: false,
            default: None,
        }
    }

    pub const fn nullable(self) -> Self {
        ColumnDef { nullable: true, ..self }
    }

    pub const fn primary_key(self) -> Self {
        ColumnDef { primary_key: true, ..self }
    }

    pub const fn indexed(self) -> Self {
        ColumnDef { indexed: true, ..self }
    }

    pub const fn default_sql(self, expr: &'static str) -> Self {
        ColumnDef {
            default: Some(expr),
            ..self
        }
    }
}

/// UUID v4 identity, generated when the row is created.
pub const UUID_PRIMARY_KEY: &[ColumnDef] = &[ColumnDef::new("id", "UUID").primary_key()];

/// `created_at` is written once; `updated_at` moves forward on every mutation.
pub const TIMESTAMPS: &[ColumnDef] = &[
    ColumnDef::new("created_at", "TIMESTAMPTZ").default_sql("now()").indexed(),
    ColumnDef::new("updated_at", "TIMESTAMPTZ").default_sql("now()"),
];

/// Optimistic-locking counter. Starts at 1, +1 per committed mutation.
pub const VERSIONED: &[ColumnDef] = &[ColumnDef::new("version", "INTEGER").default_sql("1")];

#[derive(Clone, Copy, Debug)]
pub struct EntitySchema {
    pub table: &'static str,
    pub groups: &'static [&'static [ColumnDef]],
}

impl EntitySchema {
    pub fn columns(&self) -> impl Iterator<Item = &'static ColumnDef> {
        let groups: &'static [&'static [ColumnDef]] = self.groups;
        groups.iter().flat_map(|g| g.iter())
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns().map(|c| c.name).collect()
    }

    pub fn primary_key(&self) -> Vec<&'static str> {
        self.columns().filter(|c| c.primary_key).map(|c| c.name).collect()
    }

    /// Constraint name for the primary key: `<table>_pkey`.
    pub fn primary_key_name(&self) -> String {
        format!("{}_pkey", self.table)
    }

    /// Index name for a single column: `<table>_<column>_idx`.
    pub fn index_name(&self, column: &str) -> String {
        format!("{}_{}_idx", self.table, column)
    }
}
