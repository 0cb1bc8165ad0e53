use anyhow::Result;
use rusqlite::Connection;

use crate::catalog::CatalogProduct;
use crate::record::SpecRecord;

const DB_PATH: &str = "data/specs.sqlite";

pub fn connect() -> Result<Connection> {
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            sku          TEXT PRIMARY KEY,
            path         TEXT NOT NULL,
            line_count   INTEGER NOT NULL,
            field_count  INTEGER NOT NULL,
            low_yield    BOOLEAN NOT NULL DEFAULT 0,
            status       TEXT NOT NULL CHECK(status IN ('ok','empty','error')),
            error        TEXT,
            extracted_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_documents_low_yield ON documents(low_yield);

        -- Extracted structured data, one row per (product, language)
        CREATE TABLE IF NOT EXISTS spec_records (
            product_id         TEXT NOT NULL,
            language           TEXT NOT NULL,
            load_rating        TEXT,
            slide_extension    TEXT,
            slide_height       TEXT,
            slide_thickness    TEXT,
            max_slide_length   TEXT,
            temperature_range  TEXT,
            permitted_mounting TEXT,
            other_mounting     TEXT,
            flat_mounting_note TEXT,
            corrosion_resistant TEXT,
            unit_of_measure    TEXT,
            features           TEXT,
            main_material      TEXT,
            ball_material      TEXT,
            retainer_material  TEXT,
            finish             TEXT,
            fixing             TEXT,
            notes              TEXT,
            accessories        TEXT,
            spare_parts        TEXT,
            related_products   TEXT NOT NULL DEFAULT '[]',
            variants           TEXT NOT NULL DEFAULT '[]',
            extracted_at       TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (product_id, language)
        );
        CREATE INDEX IF NOT EXISTS idx_spec_records_language ON spec_records(language);

        CREATE TABLE IF NOT EXISTS products (
            sku                    TEXT PRIMARY KEY,
            name                   TEXT,
            description            TEXT,
            features               TEXT,
            length_mm              INTEGER,
            weight_kg              REAL,
            corrosion_resistant    BOOLEAN NOT NULL DEFAULT 0,
            uom                    TEXT,
            country_of_manufacture TEXT,
            category_id            TEXT,
            datasheet_ref          TEXT,
            parent_sku             TEXT,
            pdf_specs              TEXT,
            inherited_specs        TEXT,
            enriched_at            TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_products_parent ON products(parent_sku);
        ",
    )?;
    Ok(())
}

// ── Documents ──

pub struct DocumentRow {
    pub sku: String,
    pub path: String,
    pub line_count: i64,
    pub field_count: i64,
    pub low_yield: bool,
    pub status: String, // "ok", "empty" or "error"
    pub error: Option<String>,
}

pub fn save_documents(conn: &Connection, rows: &[DocumentRow]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO documents
             (sku, path, line_count, field_count, low_yield, status, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for r in rows {
            stmt.execute(rusqlite::params![
                r.sku, r.path, r.line_count, r.field_count, r.low_yield, r.status, r.error,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Spec records ──

pub fn save_spec_records(conn: &Connection, records: &[SpecRecord]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO spec_records
             (product_id, language, load_rating, slide_extension, slide_height,
              slide_thickness, max_slide_length, temperature_range, permitted_mounting,
              other_mounting, flat_mounting_note, corrosion_resistant, unit_of_measure,
              features, main_material, ball_material, retainer_material, finish,
              fixing, notes, accessories, spare_parts, related_products, variants)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,
                     ?19,?20,?21,?22,?23,?24)",
        )?;
        for r in records {
            stmt.execute(rusqlite::params![
                r.product_id, r.language, r.load_rating, r.slide_extension, r.slide_height,
                r.slide_thickness, r.max_slide_length, r.temperature_range, r.permitted_mounting,
                r.other_mounting, r.flat_mounting_note, r.corrosion_resistant, r.unit_of_measure,
                r.features, r.main_material, r.ball_material, r.retainer_material, r.finish,
                r.fixing, r.notes, r.accessories, r.spare_parts,
                serde_json::to_string(&r.related_products)?,
                serde_json::to_string(&r.variants)?,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn fetch_spec_records(conn: &Connection, language: Option<&str>) -> Result<Vec<SpecRecord>> {
    let mut sql = String::from(
        "SELECT product_id, language, load_rating, slide_extension, slide_height,
                slide_thickness, max_slide_length, temperature_range, permitted_mounting,
                other_mounting, flat_mounting_note, corrosion_resistant, unit_of_measure,
                features, main_material, ball_material, retainer_material, finish,
                fixing, notes, accessories, spare_parts, related_products, variants
         FROM spec_records",
    );
    if language.is_some() {
        sql.push_str(" WHERE language = ?1");
    }
    sql.push_str(" ORDER BY product_id, language");

    let map_row = |row: &rusqlite::Row| -> rusqlite::Result<(SpecRecord, String, String)> {
        let rec = SpecRecord {
            product_id: row.get(0)?,
            language: row.get(1)?,
            load_rating: row.get(2)?,
            slide_extension: row.get(3)?,
            slide_height: row.get(4)?,
            slide_thickness: row.get(5)?,
            max_slide_length: row.get(6)?,
            temperature_range: row.get(7)?,
            permitted_mounting: row.get(8)?,
            other_mounting: row.get(9)?,
            flat_mounting_note: row.get(10)?,
            corrosion_resistant: row.get(11)?,
            unit_of_measure: row.get(12)?,
            features: row.get(13)?,
            main_material: row.get(14)?,
            ball_material: row.get(15)?,
            retainer_material: row.get(16)?,
            finish: row.get(17)?,
            fixing: row.get(18)?,
            notes: row.get(19)?,
            accessories: row.get(20)?,
            spare_parts: row.get(21)?,
            ..SpecRecord::default()
        };
        Ok((rec, row.get(22)?, row.get(23)?))
    };

    let mut stmt = conn.prepare(&sql)?;
    let raw: Vec<(SpecRecord, String, String)> = match language {
        Some(l) => stmt
            .query_map(rusqlite::params![l], map_row)?
            .collect::<Result<_, _>>()?,
        None => stmt.query_map([], map_row)?.collect::<Result<_, _>>()?,
    };

    let mut records = Vec::with_capacity(raw.len());
    for (mut rec, related, variants) in raw {
        rec.related_products = serde_json::from_str(&related)?;
        rec.variants = serde_json::from_str(&variants)?;
        records.push(rec);
    }
    Ok(records)
}

// ── Products ──

pub fn save_products(conn: &Connection, products: &[CatalogProduct]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO products
             (sku, name, description, features, length_mm, weight_kg, corrosion_resistant,
              uom, country_of_manufacture, category_id, datasheet_ref, parent_sku,
              pdf_specs, inherited_specs)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)",
        )?;
        for p in products {
            let pdf = p.pdf_specs.as_ref().map(serde_json::to_string).transpose()?;
            let inherited = p
                .inherited_specs
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            stmt.execute(rusqlite::params![
                p.sku, p.name, p.description, p.features, p.length_mm, p.weight_kg,
                p.corrosion_resistant, p.uom, p.country_of_manufacture, p.category_id,
                p.datasheet_ref, p.parent_sku, pdf, inherited,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

pub fn fetch_products(conn: &Connection) -> Result<Vec<CatalogProduct>> {
    let mut stmt = conn.prepare(
        "SELECT sku, name, description, features, length_mm, weight_kg, corrosion_resistant,
                uom, country_of_manufacture, category_id, datasheet_ref, parent_sku,
                pdf_specs, inherited_specs
         FROM products ORDER BY sku",
    )?;
    let raw: Vec<(CatalogProduct, Option<String>, Option<String>)> = stmt
        .query_map([], |row| {
            let p = CatalogProduct {
                sku: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                features: row.get(3)?,
                length_mm: row.get(4)?,
                weight_kg: row.get(5)?,
                corrosion_resistant: row.get(6)?,
                uom: row.get(7)?,
                country_of_manufacture: row.get(8)?,
                category_id: row.get(9)?,
                datasheet_ref: row.get(10)?,
                parent_sku: row.get(11)?,
                pdf_specs: None,
                inherited_specs: None,
            };
            Ok((p, row.get(12)?, row.get(13)?))
        })?
        .collect::<Result<_, _>>()?;

    let mut products = Vec::with_capacity(raw.len());
    for (mut p, pdf, inherited) in raw {
        p.pdf_specs = pdf.as_deref().map(serde_json::from_str).transpose()?;
        p.inherited_specs = inherited.as_deref().map(serde_json::from_str).transpose()?;
        products.push(p);
    }
    Ok(products)
}

// ── Overview ──

pub struct OverviewRow {
    pub sku: String,
    pub name: String,
    pub spec_source: String, // "own", "inherited" or ""
    pub parent_sku: String,
    pub datasheet_ref: String,
}

pub fn fetch_overview(conn: &Connection, limit: usize) -> Result<Vec<OverviewRow>> {
    let sql = format!(
        "SELECT sku, COALESCE(name,''),
                CASE WHEN pdf_specs IS NOT NULL THEN 'own'
                     WHEN inherited_specs IS NOT NULL THEN 'inherited'
                     ELSE '' END,
                COALESCE(parent_sku,''), COALESCE(datasheet_ref,'')
         FROM products
         ORDER BY sku
         LIMIT {}",
        limit
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(OverviewRow {
                sku: row.get(0)?,
                name: row.get(1)?,
                spec_source: row.get(2)?,
                parent_sku: row.get(3)?,
                datasheet_ref: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub documents: usize,
    pub low_yield: usize,
    pub records: usize,
    pub records_by_language: Vec<(String, usize)>,
    pub products: usize,
    pub own_specs: usize,
    pub inherited_specs: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let documents: usize = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
    let low_yield: usize = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE low_yield = 1",
        [],
        |r| r.get(0),
    )?;
    let records: usize = conn.query_row("SELECT COUNT(*) FROM spec_records", [], |r| r.get(0))?;
    let mut stmt =
        conn.prepare("SELECT language, COUNT(*) FROM spec_records GROUP BY language ORDER BY language")?;
    let records_by_language = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    let products: usize = conn.query_row("SELECT COUNT(*) FROM products", [], |r| r.get(0))?;
    let own_specs: usize = conn.query_row(
        "SELECT COUNT(*) FROM products WHERE pdf_specs IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let inherited_specs: usize = conn.query_row(
        "SELECT COUNT(*) FROM products WHERE inherited_specs IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        documents,
        low_yield,
        records,
        records_by_language,
        products,
        own_specs,
        inherited_specs,
    })
}

// ── Tests ──
