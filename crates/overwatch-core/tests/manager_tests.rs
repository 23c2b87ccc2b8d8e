//! Manager lifecycle against real local remotes

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Duration as Elapsed, Utc};
use overwatch_core::{
    Clock, Error, Manager, ManagerConfig, ManualClock, ProviderOptions, Repository, Resource,
    ResourceKind, ServiceAccount, StaticProducer, codec,
};
use overwatch_fs::NormalizedPath;
use overwatch_git::{GitSynchro, Store};
use overwatch_test_utils::git::RemoteFixture;
use pretty_assertions::assert_eq;

const REPOS: &str = "GitHub/acme/Repos/Repo.yml";
const ACCOUNTS: &str = "GitHub/acme/ServiceAccounts/ServiceAccount.yml";
const TTL: Duration = Duration::from_secs(600);

fn repo(name: &str, public: bool) -> Resource {
    Resource::Repo(Repository::new(name).public(public))
}

fn config_for(fixture: &RemoteFixture, name: &str) -> ManagerConfig {
    let options = ProviderOptions {
        project: "acme".to_string(),
        synchro: "git".to_string(),
        location: Some(fixture.scratch(name)),
        ..ProviderOptions::default()
    };
    ManagerConfig::new(fixture.url(), TTL, options)
}

/// Store wrapper counting how often the manager syncs.
struct CountingStore {
    inner: GitSynchro,
    syncs: Arc<AtomicUsize>,
}

impl Store for CountingStore {
    fn sync(&mut self) -> overwatch_git::Result<bool> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        self.inner.sync()
    }

    fn path(&self) -> &NormalizedPath {
        self.inner.path()
    }
}

struct Harness {
    fixture: RemoteFixture,
    producer: StaticProducer,
    clock: ManualClock,
    syncs: Arc<AtomicUsize>,
    manager: Manager<StaticProducer, ManualClock>,
}

impl Harness {
    /// Configured manager over a remote holding `a` (public) and a producer
    /// reporting `live`.
    fn new(live: Vec<Resource>) -> Self {
        let fixture = RemoteFixture::with_files(&[(REPOS, "- Name: a\n  Public: true\n")]);
        let producer = StaticProducer::new("GitHub", live).with_kinds([ResourceKind::Repo]);
        let clock = ManualClock::default();
        let syncs = Arc::new(AtomicUsize::new(0));

        let config = config_for(&fixture, "state");
        let store = CountingStore {
            inner: GitSynchro::new(config.synchro_info()).unwrap(),
            syncs: Arc::clone(&syncs),
        };
        let mut manager = Manager::with_clock(producer.clone(), clock.clone());
        manager
            .load_configuration_with_store(&config, Box::new(store))
            .unwrap();

        Self {
            fixture,
            producer,
            clock,
            syncs,
            manager,
        }
    }

    fn syncs(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }

    fn persisted(&self, kind: ResourceKind) -> Vec<Resource> {
        let path = self.manager.layout().unwrap().kind_file(kind);
        let bytes = fs::read(path.to_native()).unwrap();
        codec::decode(kind, &bytes).unwrap()
    }
}

mod unconfigured {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_operations_before_configuration() {
        let mut manager = Manager::new(StaticProducer::new("GitHub", vec![repo("a", true)]));

        assert!(!manager.is_configured());
        assert!(manager.resources().is_empty());
        assert!(manager.expires_at().is_none());
        assert!(matches!(manager.list_modified_resources(), Err(Error::NotConfigured)));
        assert!(matches!(manager.resync(), Err(Error::NotConfigured)));
    }

    #[test]
    fn test_failed_first_load_stays_unconfigured() {
        let fixture = RemoteFixture::new();
        let mut config = config_for(&fixture, "state");
        config.remote_locator = fixture.scratch("missing-remote").to_string_lossy().into_owned();

        let mut manager = Manager::new(StaticProducer::new("GitHub", Vec::new()));
        let err = manager.load_configuration(&config).unwrap_err();

        assert!(matches!(err, Error::Git(_)), "got {err:?}");
        assert!(!manager.is_configured());
    }

    #[test]
    fn test_invalid_configuration_does_no_io() {
        let fixture = RemoteFixture::with_files(&[(REPOS, "[]\n")]);
        let mut config = config_for(&fixture, "state");
        config.options.project.clear();

        let mut manager = Manager::new(StaticProducer::new("GitHub", Vec::new()));
        let err = manager.load_configuration(&config).unwrap_err();

        assert!(matches!(err, Error::ConfigMissing { .. }));
        assert!(!fixture.scratch("state").exists());
    }
}

mod configuration {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_configuration_fills_cache_and_starts_clock() {
        let fixture = RemoteFixture::with_files(&[
            (REPOS, "- Name: web\n- Name: api\n  Public: true\n"),
            (ACCOUNTS, "- Name: CI\n  Email: ci@acme.iam.gserviceaccount.com\n"),
        ]);
        let clock = ManualClock::default();
        let mut manager = Manager::with_clock(StaticProducer::new("GitHub", Vec::new()), clock.clone());

        manager.load_configuration(&config_for(&fixture, "state")).unwrap();

        assert!(manager.is_configured());
        assert_eq!(
            manager.resources(),
            vec![
                repo("api", true),
                repo("web", false),
                Resource::ServiceAccount(ServiceAccount::new("CI", "ci@acme.iam.gserviceaccount.com")),
            ]
        );
        assert_eq!(manager.expires_at(), Some(clock.now() + Elapsed::seconds(600)));
        assert!(manager.store_path().unwrap().join(REPOS).exists());
    }

    #[test]
    fn test_expiry_past_clock_range_is_an_error() {
        let fixture = RemoteFixture::with_files(&[(REPOS, "[]\n")]);
        let clock = ManualClock::new(DateTime::<Utc>::MAX_UTC - Elapsed::seconds(60));
        let mut manager = Manager::with_clock(StaticProducer::new("GitHub", Vec::new()), clock);

        let err = manager.load_configuration(&config_for(&fixture, "state")).unwrap_err();

        assert!(matches!(err, Error::InvalidTimeToLive { .. }), "got {err:?}");
        assert!(!manager.is_configured());
    }

    #[test]
    fn test_failed_reload_keeps_previous_state() {
        let mut harness = Harness::new(Vec::new());
        let before = harness.manager.resources();
        let expires = harness.manager.expires_at();

        let empty = RemoteFixture::with_files(&[("README.md", "nothing here\n")]);
        let err = harness
            .manager
            .load_configuration(&config_for(&empty, "other"))
            .unwrap_err();

        assert!(matches!(err, Error::Fs(_)), "got {err:?}");
        assert_eq!(harness.manager.resources(), before);
        assert_eq!(harness.manager.expires_at(), expires);
        assert_eq!(
            harness.manager.store_path().unwrap().as_str(),
            NormalizedPath::new(harness.fixture.scratch("state")).as_str()
        );
    }
}

mod drift {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lists_new_then_modified_without_touching_cache() {
        let harness = Harness::new(vec![repo("a", false), repo("b", true)]);

        let drift = harness.manager.list_modified_resources().unwrap();

        assert_eq!(drift, vec![repo("b", true), repo("a", false)]);
        assert_eq!(harness.manager.resources(), vec![repo("a", true)]);
    }

    #[test]
    fn test_matching_live_state_reports_nothing() {
        let harness = Harness::new(vec![repo("a", true)]);
        assert!(harness.manager.list_modified_resources().unwrap().is_empty());
    }

    #[test]
    fn test_poll_after_expiry_does_not_sync() {
        let harness = Harness::new(vec![repo("b", true)]);
        let expires = harness.manager.expires_at();
        harness.clock.advance(Elapsed::seconds(601));

        let drift = harness.manager.list_modified_resources().unwrap();

        assert_eq!(drift, vec![repo("b", true)]);
        assert_eq!(harness.syncs(), 1, "only the initial sync");
        assert_eq!(harness.manager.expires_at(), expires);
        assert_eq!(harness.manager.resources(), vec![repo("a", true)]);
    }

    #[test]
    fn test_producer_failure_surfaces() {
        let harness = Harness::new(Vec::new());
        harness.producer.fail_with("rate limited");
        let err = harness.manager.list_modified_resources().unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[test]
    fn test_classify_reports_all_three_sets() {
        let harness = Harness::new(vec![repo("a", true), repo("b", true)]);
        let classification = harness.manager.classify().unwrap();
        assert_eq!(classification.unchanged, vec![repo("a", true)]);
        assert_eq!(classification.new, vec![repo("b", true)]);
        assert!(classification.modified.is_empty());
    }
}

mod resync {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_before_expiry_is_a_no_op() {
        let mut harness = Harness::new(vec![repo("b", true)]);
        let expires = harness.manager.expires_at();

        harness.clock.advance(Elapsed::seconds(600));
        let modified = harness.manager.resync().unwrap();

        assert!(modified.is_empty());
        assert_eq!(harness.syncs(), 1, "only the initial sync");
        assert_eq!(harness.producer.fetch_count(), 0);
        assert_eq!(harness.manager.expires_at(), expires);
    }

    #[test]
    fn test_after_expiry_syncs_once_and_advances_clock() {
        let mut harness = Harness::new(vec![repo("a", false), repo("b", true)]);
        harness.clock.advance(Elapsed::seconds(601));

        let modified = harness.manager.resync().unwrap();

        assert_eq!(modified, vec![repo("a", false)]);
        assert_eq!(harness.syncs(), 2);
        assert_eq!(
            harness.manager.expires_at(),
            Some(harness.clock.now() + Elapsed::seconds(600))
        );
    }

    #[test]
    fn test_new_resources_are_cached_and_persisted() {
        let mut harness = Harness::new(vec![repo("b", true)]);
        harness.clock.advance(Elapsed::seconds(601));

        harness.manager.resync().unwrap();

        assert_eq!(harness.manager.resources(), vec![repo("a", true), repo("b", true)]);
        assert_eq!(
            harness.persisted(ResourceKind::Repo),
            vec![repo("a", true), repo("b", true)]
        );
        assert!(harness.manager.list_modified_resources().unwrap().is_empty());
    }

    #[test]
    fn test_changed_remote_purges_cache_before_repopulating() {
        let mut harness = Harness::new(Vec::new());
        harness.fixture.commit(&[(REPOS, "- Name: c\n")], "Replace a with c");
        harness.clock.advance(Elapsed::seconds(601));

        harness.manager.resync().unwrap();

        assert_eq!(harness.manager.resources(), vec![repo("c", false)]);
    }

    #[test]
    fn test_failure_leaves_clock_and_cache_untouched() {
        let mut harness = Harness::new(vec![repo("b", true)]);
        let expires = harness.manager.expires_at();
        harness.producer.fail_with("upstream unavailable");
        harness.clock.advance(Elapsed::seconds(601));

        assert!(harness.manager.resync().is_err());
        assert_eq!(harness.manager.expires_at(), expires);
        assert_eq!(harness.manager.resources(), vec![repo("a", true)]);

        harness.producer.replace(vec![repo("b", true)]);
        assert!(harness.manager.resync().unwrap().is_empty());
        assert!(harness.manager.expires_at() > expires);
    }

    #[test]
    fn test_unrepresentable_expiry_writes_nothing() {
        let mut harness = Harness::new(vec![repo("b", true)]);
        let expires = harness.manager.expires_at();
        harness.clock.set(DateTime::<Utc>::MAX_UTC - Elapsed::seconds(60));

        let err = harness.manager.resync().unwrap_err();

        assert!(matches!(err, Error::InvalidTimeToLive { .. }), "got {err:?}");
        assert_eq!(harness.manager.expires_at(), expires);
        assert_eq!(harness.manager.resources(), vec![repo("a", true)]);
        assert_eq!(harness.persisted(ResourceKind::Repo), vec![repo("a", true)]);
    }

    #[test]
    fn test_write_failure_leaves_clock_and_cache_untouched() {
        let fixture = RemoteFixture::with_files(&[
            (REPOS, "- Name: a\n  Public: true\n"),
            ("GitHub/acme/ServiceAccounts/ServiceAccount.yml/keep.txt", "occupies the kind file\n"),
        ]);
        let account = Resource::ServiceAccount(ServiceAccount::new("CI", "ci@acme.iam.gserviceaccount.com"));
        let producer = StaticProducer::new("GitHub", vec![repo("b", true), account]);
        let clock = ManualClock::default();
        let mut manager = Manager::with_clock(producer, clock.clone());
        manager.load_configuration(&config_for(&fixture, "state")).unwrap();
        let expires = manager.expires_at();
        clock.advance(Elapsed::seconds(601));

        let err = manager.resync().unwrap_err();

        assert!(matches!(err, Error::Fs(_)), "got {err:?}");
        assert_eq!(manager.expires_at(), expires);
        assert_eq!(manager.resources(), vec![repo("a", true)]);
        // Kinds ahead of the failing one were already written.
        let written = fs::read(manager.store_path().unwrap().join(REPOS).to_native()).unwrap();
        assert_eq!(
            codec::decode(ResourceKind::Repo, &written).unwrap(),
            vec![repo("a", true), repo("b", true)]
        );
    }

    #[test]
    fn test_second_resync_waits_for_new_expiry() {
        let mut harness = Harness::new(vec![repo("a", false)]);
        harness.clock.advance(Elapsed::seconds(601));
        assert_eq!(harness.manager.resync().unwrap(), vec![repo("a", false)]);

        harness.clock.advance(Elapsed::seconds(10));
        assert!(harness.manager.resync().unwrap().is_empty());
        assert_eq!(harness.syncs(), 2);
    }
}
