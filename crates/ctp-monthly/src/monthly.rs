//! HIRS_CTP_MONTHLY: monthly means of the daily cloud-top-pressure products.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use futures::stream::{self, StreamExt};
use hirs_common::{month_interval, MonthlyContext, Satellite, TimeInterval, VersionSet};
use storage::{FilesystemCatalog, ProductCatalog, ProductRef, YamlDeliveryRegistry};
use tracing::{debug, info, instrument};

use crate::compress::NetcdfRepack;
use crate::computation::{Computation, TaskInputs, TaskOutputs};
use crate::config::{JobConfig, LocatorConfig};
use crate::daily::{DailyComputation, HirsCtpDaily};
use crate::error::{JobError, JobResult};
use crate::locator::ExecutableLocator;
use crate::tool::ToolCommand;
use crate::workdir::WorkDir;

pub const MONTHLY_COMPUTATION: &str = "HIRS_CTP_MONTHLY";

/// Manifest consumed by the averaging executable.
pub const DAILY_LIST_NAME: &str = "ctp_daily_list";

/// Label prefix of the daily inputs.
pub const DAILY_INPUT_PREFIX: &str = "CTPD";

const EXISTENCE_CHECKS: usize = 8;

/// Output file name for a monthly context: `ctp.monthly.<sat>.dYYYYMM.nc`.
pub fn monthly_output_filename(satellite: Satellite, granule: NaiveDate) -> String {
    format!("ctp.monthly.{}.{}.nc", satellite, granule.format("d%Y%m"))
}

/// Execution settings of a monthly run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub work_root: PathBuf,
    pub repack: Option<NetcdfRepack>,
    pub tool_timeout: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            work_root: PathBuf::from("."),
            repack: None,
            tool_timeout: None,
        }
    }
}

/// The monthly aggregation job.
pub struct HirsCtpMonthly {
    catalog: Arc<dyn ProductCatalog>,
    daily: Arc<dyn DailyComputation>,
    locator: ExecutableLocator,
    options: RunOptions,
}

impl HirsCtpMonthly {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        daily: Arc<dyn DailyComputation>,
        locator: ExecutableLocator,
    ) -> Self {
        Self {
            catalog,
            daily,
            locator,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Wire up the filesystem catalog, the daily collaborator and the
    /// configured executable locator.
    pub fn from_config(config: &JobConfig) -> JobResult<Self> {
        let catalog = Arc::new(FilesystemCatalog::new(&config.catalog_root));

        let daily = match config.daily.availability_cutoff {
            Some(cutoff) => HirsCtpDaily::with_cutoff(cutoff),
            None => HirsCtpDaily::new(),
        };

        let locator = match &config.locator {
            LocatorConfig::PackageRoot { package_root } => {
                ExecutableLocator::package_root(package_root)
            }
            LocatorConfig::Delivered { registry_file } => {
                let registry = YamlDeliveryRegistry::load(registry_file)?;
                ExecutableLocator::delivered(Arc::new(registry))
            }
        };

        Ok(Self::new(catalog, Arc::new(daily), locator).with_options(RunOptions {
            work_root: config.work_root.clone(),
            repack: config.repack(),
            tool_timeout: config.tool_timeout(),
        }))
    }

    pub fn daily(&self) -> &Arc<dyn DailyComputation> {
        &self.daily
    }

    pub fn catalog(&self) -> &Arc<dyn ProductCatalog> {
        &self.catalog
    }
}

#[async_trait]
impl Computation for HirsCtpMonthly {
    type Context = MonthlyContext;

    fn name(&self) -> &'static str {
        MONTHLY_COMPUTATION
    }

    fn find_contexts(
        &self,
        interval: &TimeInterval,
        satellite: Satellite,
        versions: &VersionSet,
    ) -> Vec<MonthlyContext> {
        interval
            .month_starts()
            .into_iter()
            .map(|granule| MonthlyContext::new(granule, satellite, versions.clone()))
            .collect()
    }

    fn context_path(&self, context: &MonthlyContext) -> PathBuf {
        PathBuf::from("HIRS")
            .join(context.satellite.as_str())
            .join(context.granule.year().to_string())
            .join("CTP_MONTHLY")
    }

    fn output_filename(&self, context: &MonthlyContext) -> String {
        monthly_output_filename(context.satellite, context.granule)
    }

    #[instrument(skip(self, context), fields(context = %context))]
    async fn build_task(&self, context: &MonthlyContext) -> JobResult<TaskInputs> {
        let interval = month_interval(context.granule);
        let daily_contexts = self
            .daily
            .find_contexts(&interval, context.satellite, &context.versions)
            .await?;

        if daily_contexts.is_empty() {
            return Err(JobError::NotReady(format!(
                "No {} inputs available for {}",
                self.daily.name(),
                context.granule
            )));
        }

        let products: Vec<(NaiveDate, ProductRef)> = daily_contexts
            .iter()
            .map(|daily_context| (daily_context.granule, self.daily.output_product(daily_context)))
            .collect();

        // Existence checks run concurrently; `buffered` keeps enumeration order.
        let catalog = self.catalog.clone();
        let checks: Vec<_> = stream::iter(products.into_iter().enumerate())
            .map(move |(i, (day, product))| {
                let catalog = catalog.clone();
                async move {
                    let exists = catalog.exists(&product).await;
                    (i, day, product, exists)
                }
            })
            .buffered(EXISTENCE_CHECKS)
            .collect()
            .await;

        let mut inputs = TaskInputs::new();
        for (i, day, product, exists) in checks {
            if exists? {
                inputs.insert(
                    format!("{}-{}", DAILY_INPUT_PREFIX, i),
                    self.catalog.path(&product),
                );
            } else {
                debug!(day = %day, "Daily product missing, skipping");
            }
        }

        info!(
            daily_contexts = daily_contexts.len(),
            inputs = inputs.len(),
            "Resolved daily inputs"
        );

        // An average over zero days is never produced.
        if inputs.is_empty() {
            return Err(JobError::NotReady(format!(
                "None of the {} {} products for {} are stored yet",
                daily_contexts.len(),
                self.daily.name(),
                context.granule
            )));
        }
        Ok(inputs)
    }

    #[instrument(skip(self, inputs, context), fields(context = %context, inputs = inputs.len()))]
    async fn run_task(
        &self,
        inputs: &TaskInputs,
        context: &MonthlyContext,
    ) -> JobResult<TaskOutputs> {
        if inputs.is_empty() {
            return Err(JobError::Staging("no daily inputs to aggregate".to_string()));
        }

        let prefix = format!(
            "hirs_ctp_monthly_{}_{}",
            context.satellite,
            context.granule.format("%Y%m")
        );
        let work = WorkDir::create(&self.options.work_root, &prefix).await?;

        let staged = work.stage_inputs(inputs).await?;
        work.write_manifest(DAILY_LIST_NAME, staged.paths()).await?;

        let tool = self.locator.locate(&context.versions).await?;
        let output = self.output_filename(context);

        ToolCommand::new(&tool.executable)
            .arg(DAILY_LIST_NAME)
            .arg(&output)
            .current_dir(work.path())
            .library_dir(&tool.library_dir)
            .timeout(self.options.tool_timeout)
            .run()
            .await?;

        let output_path = work.join(&output);
        if !tokio::fs::try_exists(&output_path).await? {
            return Err(JobError::OutputMissing(output_path));
        }

        if let Some(repack) = &self.options.repack {
            repack
                .repack(&output_path, self.options.tool_timeout)
                .await?;
        }

        info!(output = %output_path.display(), version = %tool.version, "Monthly output produced");
        Ok(TaskOutputs { out: output_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn versions() -> VersionSet {
        VersionSet::new("v20151014", "v20151014", "v20150915", "v20150915").unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn job() -> HirsCtpMonthly {
        HirsCtpMonthly::new(
            Arc::new(FilesystemCatalog::new("/nonexistent")),
            Arc::new(HirsCtpDaily::new()),
            ExecutableLocator::package_root("/opt/hirs_ctp_monthly"),
        )
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(
            monthly_output_filename(Satellite::MetopB, date(2017, 6, 1)),
            "ctp.monthly.metop-b.d201706.nc"
        );
    }

    #[test]
    fn test_find_contexts_for_a_year() {
        let interval = TimeInterval::half_open(
            date(2017, 1, 1).and_time(NaiveTime::MIN),
            date(2018, 1, 1).and_time(NaiveTime::MIN),
        );
        let contexts = job().find_contexts(&interval, Satellite::MetopB, &versions());

        assert_eq!(contexts.len(), 12);
        for (i, ctx) in contexts.iter().enumerate() {
            assert_eq!(ctx.granule, date(2017, i as u32 + 1, 1));
            assert_eq!(ctx.satellite, Satellite::MetopB);
        }
        assert!(contexts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_context_path_and_product() {
        let job = job();
        let ctx = MonthlyContext::new(date(2017, 6, 1), Satellite::MetopB, versions());
        let product = job.product(&ctx);
        assert_eq!(product.computation, "HIRS_CTP_MONTHLY");
        assert_eq!(
            product.relative_path(),
            PathBuf::from("HIRS/metop-b/2017/CTP_MONTHLY/ctp.monthly.metop-b.d201706.nc")
        );
    }

    #[test]
    fn test_from_config_package_root() {
        let config = JobConfig::from_yaml(
            r#"
catalog_root: /data/products
work_root: /scratch
locator: { type: package_root, package_root: /opt/hirs_ctp_monthly }
compress: { enabled: true }
tool_timeout_secs: 60
"#,
        )
        .unwrap();
        let job = HirsCtpMonthly::from_config(&config).unwrap();
        assert_eq!(job.options.work_root, PathBuf::from("/scratch"));
        assert!(job.options.repack.is_some());
        assert_eq!(job.options.tool_timeout, Some(Duration::from_secs(60)));
        assert_eq!(job.daily().name(), "HIRS_CTP_DAILY");
    }

    #[test]
    fn test_from_config_missing_registry() {
        let config = JobConfig::from_yaml(
            r#"
catalog_root: /data/products
locator: { type: delivered, registry_file: /nonexistent/deliveries.yaml }
"#,
        )
        .unwrap();
        assert!(matches!(
            HirsCtpMonthly::from_config(&config),
            Err(JobError::Storage(_))
        ));
    }
}
