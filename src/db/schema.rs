pub const SCHEMA: &str = r#"
-- geography tables
CREATE TABLE IF NOT EXISTS country (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL COLLATE NOCASE,
    UNIQUE(name)
);

CREATE INDEX IF NOT EXISTS idx_country_name ON country(name);

CREATE TABLE IF NOT EXISTS subdivision (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL COLLATE NOCASE,
    country INTEGER NOT NULL REFERENCES country(id),
    UNIQUE(name, country)
);

CREATE INDEX IF NOT EXISTS idx_subdivision_name ON subdivision(name);

CREATE TABLE IF NOT EXISTS county (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL COLLATE NOCASE,
    subdivision INTEGER NOT NULL REFERENCES subdivision(id),
    UNIQUE(name, subdivision)
);

CREATE INDEX IF NOT EXISTS idx_county_name ON county(name);

-- fact table: one row per (day, geography) key; day is ISO-8601 text so
-- lexicographic order is chronological order
CREATE TABLE IF NOT EXISTS cases (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    day TEXT NOT NULL,
    country INTEGER NOT NULL REFERENCES country(id),
    subdivision INTEGER NOT NULL REFERENCES subdivision(id),
    county INTEGER NOT NULL REFERENCES county(id),
    positive_cases INTEGER NOT NULL,
    deaths INTEGER NOT NULL,
    recovered INTEGER NOT NULL,
    UNIQUE(day, country, subdivision, county)
);

CREATE INDEX IF NOT EXISTS idx_cases_day ON cases(day);

-- days already fully folded in from a cumulative source
CREATE TABLE IF NOT EXISTS tracked_dates (
    day TEXT PRIMARY KEY
);

-- id 0 at each level means "no finer geography reported"
INSERT OR IGNORE INTO country (id, name) VALUES (0, 'None');
INSERT OR IGNORE INTO subdivision (id, name, country) VALUES (0, 'None', 0);
INSERT OR IGNORE INTO county (id, name, subdivision) VALUES (0, 'None', 0);

-- daily sums per geography level
CREATE VIEW IF NOT EXISTS country_daily AS
SELECT country AS geo, day,
       SUM(positive_cases) AS positive_cases,
       SUM(deaths) AS deaths,
       SUM(recovered) AS recovered
FROM cases
GROUP BY country, day;

CREATE VIEW IF NOT EXISTS subdivision_daily AS
SELECT subdivision AS geo, day,
       SUM(positive_cases) AS positive_cases,
       SUM(deaths) AS deaths,
       SUM(recovered) AS recovered
FROM cases
GROUP BY subdivision, day;

CREATE VIEW IF NOT EXISTS county_daily AS
SELECT county AS geo, day,
       SUM(positive_cases) AS positive_cases,
       SUM(deaths) AS deaths,
       SUM(recovered) AS recovered
FROM cases
GROUP BY county, day;

CREATE VIEW IF NOT EXISTS world_daily AS
SELECT day,
       SUM(positive_cases) AS positive_cases,
       SUM(deaths) AS deaths,
       SUM(recovered) AS recovered
FROM cases
GROUP BY day;

-- 3-day rolling averages; windows at the start of a series average over
-- however many days exist
CREATE VIEW IF NOT EXISTS country_rolling AS
SELECT geo, day,
       CAST(ROUND(AVG(positive_cases) OVER w) AS INTEGER) AS positive_cases,
       CAST(ROUND(AVG(deaths) OVER w) AS INTEGER) AS deaths,
       CAST(ROUND(AVG(recovered) OVER w) AS INTEGER) AS recovered
FROM country_daily
WINDOW w AS (PARTITION BY geo ORDER BY day ROWS BETWEEN 2 PRECEDING AND CURRENT ROW);

CREATE VIEW IF NOT EXISTS subdivision_rolling AS
SELECT geo, day,
       CAST(ROUND(AVG(positive_cases) OVER w) AS INTEGER) AS positive_cases,
       CAST(ROUND(AVG(deaths) OVER w) AS INTEGER) AS deaths,
       CAST(ROUND(AVG(recovered) OVER w) AS INTEGER) AS recovered
FROM subdivision_daily
WINDOW w AS (PARTITION BY geo ORDER BY day ROWS BETWEEN 2 PRECEDING AND CURRENT ROW);

CREATE VIEW IF NOT EXISTS county_rolling AS
SELECT geo, day,
       CAST(ROUND(AVG(positive_cases) OVER w) AS INTEGER) AS positive_cases,
       CAST(ROUND(AVG(deaths) OVER w) AS INTEGER) AS deaths,
       CAST(ROUND(AVG(recovered) OVER w) AS INTEGER) AS recovered
FROM county_daily
WINDOW w AS (PARTITION BY geo ORDER BY day ROWS BETWEEN 2 PRECEDING AND CURRENT ROW);

CREATE VIEW IF NOT EXISTS world_rolling AS
SELECT day,
       CAST(ROUND(AVG(positive_cases) OVER w) AS INTEGER) AS positive_cases,
       CAST(ROUND(AVG(deaths) OVER w) AS INTEGER) AS deaths,
       CAST(ROUND(AVG(recovered) OVER w) AS INTEGER) AS recovered
FROM world_daily
WINDOW w AS (ORDER BY day ROWS BETWEEN 2 PRECEDING AND CURRENT ROW);

-- day-over-day deltas of the rolling series; the first day of a series
-- has no predecessor and is NULL
CREATE VIEW IF NOT EXISTS country_derivative AS
SELECT geo, day,
       positive_cases - LAG(positive_cases) OVER w AS positive_cases,
       deaths - LAG(deaths) OVER w AS deaths,
       recovered - LAG(recovered) OVER w AS recovered
FROM country_rolling
WINDOW w AS (PARTITION BY geo ORDER BY day);

CREATE VIEW IF NOT EXISTS subdivision_derivative AS
SELECT geo, day,
       positive_cases - LAG(positive_cases) OVER w AS positive_cases,
       deaths - LAG(deaths) OVER w AS deaths,
       recovered - LAG(recovered) OVER w AS recovered
FROM subdivision_rolling
WINDOW w AS (PARTITION BY geo ORDER BY day);

CREATE VIEW IF NOT EXISTS county_derivative AS
SELECT geo, day,
       positive_cases - LAG(positive_cases) OVER w AS positive_cases,
       deaths - LAG(deaths) OVER w AS deaths,
       recovered - LAG(recovered) OVER w AS recovered
FROM county_rolling
WINDOW w AS (PARTITION BY geo ORDER BY day);

CREATE VIEW IF NOT EXISTS world_derivative AS
SELECT day,
       positive_cases - LAG(positive_cases) OVER w AS positive_cases,
       deaths - LAG(deaths) OVER w AS deaths,
       recovered - LAG(recovered) OVER w AS recovered
FROM world_rolling
WINDOW w AS (ORDER BY day);
"#;
