//! End-to-end ingestion and query tests against in-memory stores.

use chrono::NaiveDate;

use crate::db::Repository;
use crate::feed::{FeedVariant, SourceTable};
use crate::ingest::{ingest, SourceSet};
use crate::models::{BoroughPolicy, GeoLevel, MergePolicy, SeriesMode};

async fn repo() -> Repository {
    Repository::open_in_memory().await.expect("in-memory store")
}

fn table(csv: &str, variant: FeedVariant) -> SourceTable {
    SourceTable::from_reader(csv.as_bytes(), variant).expect("source table")
}

fn global_set(confirmed: &str, deaths: &str, recovered: &str) -> SourceSet {
    SourceSet {
        confirmed: table(confirmed, FeedVariant::Global),
        deaths: table(deaths, FeedVariant::Global),
        recovered: Some(table(recovered, FeedVariant::Global)),
    }
}

fn us_set(confirmed: &str, deaths: &str) -> SourceSet {
    SourceSet {
        confirmed: table(confirmed, FeedVariant::UsCounty),
        deaths: table(deaths, FeedVariant::UsCounty),
        recovered: None,
    }
}

fn day(month: u32, day_of_month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, month, day_of_month).unwrap()
}

async fn country_id(repo: &Repository, name: &str) -> i64 {
    repo.list_countries()
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.name == name)
        .map(|c| c.id)
        .expect("country is registered")
}

async fn subdivision_id(repo: &Repository, country: i64, name: &str) -> i64 {
    repo.list_subdivisions(country)
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.name == name)
        .map(|s| s.id)
        .expect("subdivision is registered")
}

// ─── Reconciliation ──────────────────────────────────────────────────────

#[tokio::test]
async fn ingesting_the_same_file_twice_is_idempotent() {
    let r = repo().await;
    let make = || {
        global_set(
            "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\n,France,46.2,2.2,1,2\n",
            "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\n,France,46.2,2.2,0,1\n",
            "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\n,France,46.2,2.2,0,0\n",
        )
    };

    let first = ingest(&r, &make(), MergePolicy::Replace).await.unwrap();
    assert_eq!(first.facts_written, 2);

    let france = country_id(&r, "France").await;
    let before = r
        .series(GeoLevel::Country, france, SeriesMode::Raw)
        .await
        .unwrap();

    let second = ingest(&r, &make(), MergePolicy::Replace).await.unwrap();
    assert_eq!(second.facts_written, 0);
    assert_eq!(second.facts_skipped, 2);

    let after = r
        .series(GeoLevel::Country, france, SeriesMode::Raw)
        .await
        .unwrap();
    assert_eq!(before, after);
    assert_eq!(after[0].positive_cases, Some(1));
    assert_eq!(after[1].positive_cases, Some(2));
    assert_eq!(after[1].deaths, Some(1));
}

#[tokio::test]
async fn tracked_days_suppress_a_later_overlapping_source() {
    let r = repo().await;
    let first = global_set(
        "Province/State,Country/Region,1/22/20\n,France,5\n",
        "Province/State,Country/Region,1/22/20\n,France,0\n",
        "Province/State,Country/Region,1/22/20\n,France,0\n",
    );
    ingest(&r, &first, MergePolicy::Replace).await.unwrap();

    // same day, different geography: ignored wholesale
    let second = global_set(
        "Province/State,Country/Region,1/22/20\n,Germany,9\n",
        "Province/State,Country/Region,1/22/20\n,Germany,0\n",
        "Province/State,Country/Region,1/22/20\n,Germany,0\n",
    );
    let summary = ingest(&r, &second, MergePolicy::Replace).await.unwrap();
    assert_eq!(summary.facts_written, 0);

    let countries = r.list_countries().await.unwrap();
    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0].name, "France");

    let world = r.world_series(SeriesMode::Raw).await.unwrap();
    assert_eq!(world.len(), 1);
    assert_eq!(world[0].positive_cases, Some(5));
}

#[tokio::test]
async fn synonym_rows_merge_even_into_tracked_days() {
    let r = repo().await;
    let global = global_set(
        "Province/State,Country/Region,1/22/20\n,France,5\n",
        "Province/State,Country/Region,1/22/20\n,France,0\n",
        "Province/State,Country/Region,1/22/20\n,France,0\n",
    );
    ingest(&r, &global, MergePolicy::Replace).await.unwrap();

    let us = us_set(
        "Admin2,Province_State,Country_Region,1/22/20\n\
         Baker,Oregon,US,10\n\
         ,\"Washington County, OR\",US,3\n\
         ,\"Clackamas County, OR\",US,4\n",
        "Admin2,Province_State,Country_Region,1/22/20\n\
         Baker,Oregon,US,1\n\
         ,\"Washington County, OR\",US,1\n\
         ,\"Clackamas County, OR\",US,2\n",
    );
    let summary = ingest(&r, &us, MergePolicy::Replace).await.unwrap();
    // only the two synonym contributions made it past the ledger
    assert_eq!(summary.facts_written, 2);
    assert_eq!(summary.facts_skipped, 1);

    let us_id = country_id(&r, "US").await;
    let subdivisions = r.list_subdivisions(us_id).await.unwrap();
    assert_eq!(subdivisions.len(), 1);
    assert_eq!(subdivisions[0].name, "Oregon");

    let oregon = subdivisions[0].id;
    let series = r
        .series(GeoLevel::Subdivision, oregon, SeriesMode::Raw)
        .await
        .unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].positive_cases, Some(7));
    assert_eq!(series[0].deaths, Some(3));

    // synonym contributions never create county rows
    assert!(r.list_counties(oregon).await.unwrap().is_empty());
}

#[tokio::test]
async fn synonym_rows_increment_the_state_aggregate_on_fresh_days() {
    let r = repo().await;
    let us = us_set(
        "Admin2,Province_State,Country_Region,1/22/20\n\
         Baker,Oregon,US,10\n\
         ,\"Washington County, OR\",US,3\n",
        "Admin2,Province_State,Country_Region,1/22/20\n\
         Baker,Oregon,US,0\n\
         ,\"Washington County, OR\",US,0\n",
    );
    ingest(&r, &us, MergePolicy::Replace).await.unwrap();

    let us_id = country_id(&r, "US").await;
    let oregon = subdivision_id(&r, us_id, "Oregon").await;

    let series = r
        .series(GeoLevel::Subdivision, oregon, SeriesMode::Raw)
        .await
        .unwrap();
    assert_eq!(series[0].positive_cases, Some(13));

    // the direct county row is still resolved at full resolution
    let counties = r.list_counties(oregon).await.unwrap();
    assert_eq!(counties.len(), 1);
    assert_eq!(counties[0].name, "Baker");
    let baker = r
        .series(GeoLevel::County, counties[0].id, SeriesMode::Raw)
        .await
        .unwrap();
    assert_eq!(baker[0].positive_cases, Some(10));
}

#[tokio::test]
async fn missing_sibling_values_zero_fill() {
    let r = repo().await;
    let set = global_set(
        "Province/State,Country/Region,1/22/20\n,France,120\n",
        "Province/State,Country/Region,1/22/20\n,France,\n",
        "Province/State,Country/Region,1/22/20\n,Germany,7\n",
    );
    ingest(&r, &set, MergePolicy::Replace).await.unwrap();

    let france = country_id(&r, "France").await;
    let series = r
        .series(GeoLevel::Country, france, SeriesMode::Raw)
        .await
        .unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].positive_cases, Some(120));
    assert_eq!(series[0].deaths, Some(0));
    assert_eq!(series[0].recovered, Some(0));
}

#[tokio::test]
async fn missing_confirmed_cell_contributes_no_fact() {
    let r = repo().await;
    let set = global_set(
        "Province/State,Country/Region,1/22/20,1/23/20\n,France,,5\n",
        "Province/State,Country/Region,1/22/20,1/23/20\n,France,1,1\n",
        "Province/State,Country/Region,1/22/20,1/23/20\n,France,0,0\n",
    );
    ingest(&r, &set, MergePolicy::Replace).await.unwrap();

    let france = country_id(&r, "France").await;
    let series = r
        .series(GeoLevel::Country, france, SeriesMode::Raw)
        .await
        .unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].day, day(1, 23));
    assert_eq!(series[0].positive_cases, Some(5));
}

// ─── Aggregation views ───────────────────────────────────────────────────

#[tokio::test]
async fn rolling_average_uses_partial_windows_at_the_start() {
    let r = repo().await;
    let set = global_set(
        "Province/State,Country/Region,1/22/20,1/23/20,1/24/20,1/25/20\n,France,10,20,30,60\n",
        "Province/State,Country/Region,1/22/20,1/23/20,1/24/20,1/25/20\n,France,0,0,0,0\n",
        "Province/State,Country/Region,1/22/20,1/23/20,1/24/20,1/25/20\n,France,0,0,0,0\n",
    );
    ingest(&r, &set, MergePolicy::Replace).await.unwrap();

    let france = country_id(&r, "France").await;
    let rolling = r
        .series(GeoLevel::Country, france, SeriesMode::RollingAverage)
        .await
        .unwrap();
    let values: Vec<Option<i64>> = rolling.iter().map(|p| p.positive_cases).collect();
    assert_eq!(values, vec![Some(10), Some(15), Some(20), Some(37)]);
}

#[tokio::test]
async fn derivative_is_the_day_over_day_delta_of_the_rolling_series() {
    let r = repo().await;
    let set = global_set(
        "Province/State,Country/Region,1/22/20,1/23/20,1/24/20,1/25/20\n,France,10,20,30,60\n",
        "Province/State,Country/Region,1/22/20,1/23/20,1/24/20,1/25/20\n,France,0,0,0,0\n",
        "Province/State,Country/Region,1/22/20,1/23/20,1/24/20,1/25/20\n,France,0,0,0,0\n",
    );
    ingest(&r, &set, MergePolicy::Replace).await.unwrap();

    let france = country_id(&r, "France").await;
    let derivative = r
        .series(GeoLevel::Country, france, SeriesMode::Derivative)
        .await
        .unwrap();
    let values: Vec<Option<i64>> = derivative.iter().map(|p| p.positive_cases).collect();
    assert_eq!(values, vec![None, Some(5), Some(5), Some(17)]);
}

#[tokio::test]
async fn world_series_is_the_per_day_sum_over_countries() {
    let r = repo().await;
    let set = global_set(
        "Province/State,Country/Region,1/22/20,1/23/20\n,France,1,2\n,Germany,10,20\n",
        "Province/State,Country/Region,1/22/20,1/23/20\n,France,0,0\n,Germany,0,0\n",
        "Province/State,Country/Region,1/22/20,1/23/20\n,France,0,0\n,Germany,0,0\n",
    );
    ingest(&r, &set, MergePolicy::Replace).await.unwrap();

    let world = r.world_series(SeriesMode::Raw).await.unwrap();
    let values: Vec<Option<i64>> = world.iter().map(|p| p.positive_cases).collect();
    assert_eq!(values, vec![Some(11), Some(22)]);

    // identical to summing each country's raw series day by day
    let mut by_day = std::collections::BTreeMap::new();
    for country in r.list_countries().await.unwrap() {
        for point in r
            .series(GeoLevel::Country, country.id, SeriesMode::Raw)
            .await
            .unwrap()
        {
            *by_day.entry(point.day).or_insert(0) += point.positive_cases.unwrap();
        }
    }
    for point in &world {
        assert_eq!(by_day.get(&point.day).copied(), point.positive_cases);
    }
}

// ─── Geography registry ──────────────────────────────────────────────────

#[tokio::test]
async fn geography_resolution_is_case_insensitive_and_stable() {
    let r = repo().await;
    let a = r.resolve_country("France").await.unwrap();
    let b = r.resolve_country("FRANCE").await.unwrap();
    let c = r.resolve_country("  france ").await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a, c);

    // the first-seen spelling wins
    let countries = r.list_countries().await.unwrap();
    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0].name, "France");
}

#[tokio::test]
async fn subdivisions_are_scoped_to_their_country() {
    let r = repo().await;
    let australia = r.resolve_country("Australia").await.unwrap();
    let canada = r.resolve_country("Canada").await.unwrap();

    let a = r.resolve_subdivision("Victoria", australia).await.unwrap();
    let b = r.resolve_subdivision("Victoria", canada).await.unwrap();
    assert_ne!(a, b);

    let again = r.resolve_subdivision("Victoria", australia).await.unwrap();
    assert_eq!(a, again);
}

#[tokio::test]
async fn sentinel_rows_never_appear_in_listings() {
    let r = repo().await;
    let set = global_set(
        "Province/State,Country/Region,1/22/20\n,France,1\n",
        "Province/State,Country/Region,1/22/20\n,France,0\n",
        "Province/State,Country/Region,1/22/20\n,France,0\n",
    );
    ingest(&r, &set, MergePolicy::Replace).await.unwrap();

    let countries = r.list_countries().await.unwrap();
    assert!(countries.iter().all(|c| c.id > 0 && c.name != "None"));

    let france = country_id(&r, "France").await;
    assert!(r.list_subdivisions(france).await.unwrap().is_empty());
}

// ─── Borough cleanup ─────────────────────────────────────────────────────

fn nyc_set() -> SourceSet {
    us_set(
        "Admin2,Province_State,Country_Region,1/22/20\n\
         Bronx,New York,US,10\n\
         Brooklyn,New York,US,20\n\
         New York City,New York,US,100\n",
        "Admin2,Province_State,Country_Region,1/22/20\n\
         Bronx,New York,US,1\n\
         Brooklyn,New York,US,2\n\
         New York City,New York,US,10\n",
    )
}

#[tokio::test]
async fn borough_cleanup_drop_deletes_borough_facts() {
    let r = repo().await;
    ingest(&r, &nyc_set(), MergePolicy::Replace).await.unwrap();

    let removed = r.cleanup_boroughs(BoroughPolicy::Drop).await.unwrap();
    assert_eq!(removed, 2);

    let us_id = country_id(&r, "US").await;
    let new_york = subdivision_id(&r, us_id, "New York").await;
    let counties = r.list_counties(new_york).await.unwrap();
    assert_eq!(counties.len(), 1);
    assert_eq!(counties[0].name, "New York City");

    let city = r
        .series(GeoLevel::County, counties[0].id, SeriesMode::Raw)
        .await
        .unwrap();
    assert_eq!(city[0].positive_cases, Some(100));

    // the state aggregate loses the borough contributions
    let state = r
        .series(GeoLevel::Subdivision, new_york, SeriesMode::Raw)
        .await
        .unwrap();
    assert_eq!(state[0].positive_cases, Some(100));
}

#[tokio::test]
async fn borough_cleanup_merge_up_folds_into_the_city_fact() {
    let r = repo().await;
    ingest(&r, &nyc_set(), MergePolicy::Replace).await.unwrap();

    let removed = r.cleanup_boroughs(BoroughPolicy::MergeUp).await.unwrap();
    assert_eq!(removed, 2);

    let us_id = country_id(&r, "US").await;
    let new_york = subdivision_id(&r, us_id, "New York").await;
    let counties = r.list_counties(new_york).await.unwrap();
    assert_eq!(counties.len(), 1);

    let city = r
        .series(GeoLevel::County, counties[0].id, SeriesMode::Raw)
        .await
        .unwrap();
    assert_eq!(city[0].positive_cases, Some(130));
    assert_eq!(city[0].deaths, Some(13));
}

// ─── Resumability ────────────────────────────────────────────────────────

#[tokio::test]
async fn tracked_ledger_survives_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("covid.db").to_string_lossy().to_string();

    let make = || {
        global_set(
            "Province/State,Country/Region,1/22/20\n,France,5\n",
            "Province/State,Country/Region,1/22/20\n,France,1\n",
            "Province/State,Country/Region,1/22/20\n,France,0\n",
        )
    };

    {
        let r = Repository::new(&db_path).await.unwrap();
        let summary = ingest(&r, &make(), MergePolicy::Replace).await.unwrap();
        assert_eq!(summary.facts_written, 1);
    }

    let r = Repository::new(&db_path).await.unwrap();
    let summary = ingest(&r, &make(), MergePolicy::Replace).await.unwrap();
    assert_eq!(summary.facts_written, 0);

    let france = country_id(&r, "France").await;
    let series = r
        .series(GeoLevel::Country, france, SeriesMode::Raw)
        .await
        .unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].positive_cases, Some(5));
}
