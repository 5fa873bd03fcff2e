//! Eligibility matrix: the static model-family catalog and the hard-attribute
//! filter that decides which families may satisfy a request.

use warden_types::{
    ComplianceTier, ComponentKind, Constraints, DataType, DeploymentTarget, DesignRequest,
    HardwareClass, ModelFamily, PipelineComponent, TaskType,
};

/// Model size ceiling assumed for edge deployment when the request does not
/// set `max_model_size_mb`.
const DEFAULT_EDGE_MODEL_SIZE_MB: u32 = 100;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Static catalog entry: per-run resource/accuracy envelope for one family.
#[derive(Debug, Clone)]
pub struct ModelProfile {
    pub family: ModelFamily,
    pub name: &'static str,
    pub cost_per_run: f64,
    pub carbon_per_run: f64,
    pub latency_ms: u64,
    pub accuracy_floor: f64,
    pub accuracy_ceiling: f64,
    pub min_cost: f64,
    pub requires_gpu: bool,
    pub model_size_mb: u32,
    pub supported_data_types: &'static [DataType],
    pub supported_tasks: &'static [TaskType],
    pub description: &'static str,
}

static CATALOG: &[ModelProfile] = &[
    ModelProfile {
        family: ModelFamily::Classical,
        name: "Classical ML",
        cost_per_run: 0.1,
        carbon_per_run: 0.01,
        latency_ms: 100,
        accuracy_floor: 0.6,
        accuracy_ceiling: 0.85,
        min_cost: 0.1,
        requires_gpu: false,
        model_size_mb: 10,
        supported_data_types: &[DataType::Tabular, DataType::TimeSeries],
        supported_tasks: &[
            TaskType::Classification,
            TaskType::Regression,
            TaskType::Clustering,
            TaskType::Forecasting,
        ],
        description: "Traditional ML models like Random Forest, XGBoost, SVM",
    },
    ModelProfile {
        family: ModelFamily::SmallDeep,
        name: "Small Deep Learning",
        cost_per_run: 1.0,
        carbon_per_run: 0.1,
        latency_ms: 500,
        accuracy_floor: 0.75,
        accuracy_ceiling: 0.92,
        min_cost: 0.5,
        requires_gpu: true,
        model_size_mb: 50,
        supported_data_types: &[
            DataType::Tabular,
            DataType::Text,
            DataType::Image,
            DataType::TimeSeries,
        ],
        supported_tasks: &[
            TaskType::Classification,
            TaskType::Regression,
            TaskType::Ner,
            TaskType::ObjectDetection,
        ],
        description: "Lightweight neural networks optimized for efficiency",
    },
    ModelProfile {
        family: ModelFamily::Compressed,
        name: "Compressed/Quantized",
        cost_per_run: 0.3,
        carbon_per_run: 0.03,
        latency_ms: 200,
        accuracy_floor: 0.7,
        accuracy_ceiling: 0.88,
        min_cost: 0.2,
        requires_gpu: false,
        model_size_mb: 20,
        supported_data_types: &[DataType::Tabular, DataType::Text, DataType::Image],
        supported_tasks: &[TaskType::Classification, TaskType::Regression, TaskType::Ner],
        description: "Quantized and pruned models for efficient inference",
    },
    ModelProfile {
        family: ModelFamily::Transformer,
        name: "Transformer Models",
        cost_per_run: 5.0,
        carbon_per_run: 0.5,
        latency_ms: 2000,
        accuracy_floor: 0.85,
        accuracy_ceiling: 0.98,
        min_cost: 3.0,
        requires_gpu: true,
        model_size_mb: 500,
        supported_data_types: &[DataType::Text, DataType::Image],
        supported_tasks: &[
            TaskType::Classification,
            TaskType::Ner,
            TaskType::Summarization,
            TaskType::Translation,
            TaskType::ObjectDetection,
        ],
        description: "BERT, GPT, ViT and other transformer architectures",
    },
    ModelProfile {
        family: ModelFamily::Legacy,
        name: "Legacy/Ensemble",
        cost_per_run: 2.0,
        carbon_per_run: 0.2,
        latency_ms: 800,
        accuracy_floor: 0.78,
        accuracy_ceiling: 0.9,
        min_cost: 1.0,
        requires_gpu: false,
        model_size_mb: 100,
        supported_data_types: &[DataType::Tabular, DataType::Text, DataType::TimeSeries],
        supported_tasks: &[
            TaskType::Classification,
            TaskType::Regression,
            TaskType::Forecasting,
        ],
        description: "Traditional deep learning and ensemble methods",
    },
];

/// The full catalog, loaded once at process start.
pub fn catalog() -> &'static [ModelProfile] {
    CATALOG
}

/// Look up the profile for a family. The catalog is closed over
/// [`ModelFamily`], so every variant has exactly one entry.
pub fn profile(family: ModelFamily) -> &'static ModelProfile {
    CATALOG
        .iter()
        .find(|p| p.family == family)
        .unwrap_or_else(|| unreachable!("catalog covers all model families"))
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

/// All model families that can satisfy the request's hard attributes.
/// Pure function over the static catalog plus the request.
pub fn eligible_families(request: &DesignRequest) -> Vec<ModelFamily> {
    CATALOG
        .iter()
        .filter(|p| is_eligible(p, request))
        .map(|p| p.family)
        .collect()
}

fn is_eligible(profile: &ModelProfile, request: &DesignRequest) -> bool {
    let constraints = &request.constraints;
    let data_type = request.data_profile.data_type;

    if !profile.supported_data_types.contains(&data_type) {
        return false;
    }
    if let Some(task) = request.task {
        if !profile.supported_tasks.contains(&task) {
            return false;
        }
    }
    if profile.min_cost > constraints.max_cost_usd {
        return false;
    }
    if profile.carbon_per_run > constraints.max_carbon_kg {
        return false;
    }

    // GPU-requiring profiles forced onto CPU hardware run slower, so they get
    // double the latency allowance before being ruled out.
    let latency_limit = if profile.requires_gpu && constraints.hardware == HardwareClass::Cpu {
        constraints.max_latency_ms.saturating_mul(2)
    } else {
        constraints.max_latency_ms
    };
    if profile.latency_ms > latency_limit {
        return false;
    }

    if profile.accuracy_ceiling < constraints.min_accuracy {
        return false;
    }

    if request.deployment == DeploymentTarget::Edge {
        let size_limit = constraints
            .max_model_size_mb
            .unwrap_or(DEFAULT_EDGE_MODEL_SIZE_MB);
        if profile.model_size_mb > size_limit {
            return false;
        }
    }

    if constraints.compliance == ComplianceTier::HighlyRegulated
        && !matches!(
            profile.family,
            ModelFamily::Classical | ModelFamily::Compressed
        )
    {
        return false;
    }

    true
}

// ---------------------------------------------------------------------------
// Components and estimates
// ---------------------------------------------------------------------------

/// Pipeline component template for a family and data type.
pub fn components_for(family: ModelFamily, data_type: DataType) -> Vec<PipelineComponent> {
    let mut components = Vec::new();

    let (source_name, source_tool) = match data_type {
        DataType::Tabular | DataType::TimeSeries => ("CSV Reader", "pandas"),
        DataType::Text => ("Text Loader", "huggingface"),
        DataType::Image => ("Image Loader", "PIL"),
    };
    components.push(PipelineComponent {
        kind: ComponentKind::Source,
        name: source_name.into(),
        tool: source_tool.into(),
    });

    match data_type {
        DataType::Tabular | DataType::TimeSeries => {
            components.push(PipelineComponent {
                kind: ComponentKind::Transform,
                name: "Preprocessor".into(),
                tool: "sklearn".into(),
            });
        }
        DataType::Text => {
            components.push(PipelineComponent {
                kind: ComponentKind::Transform,
                name: "Tokenizer".into(),
                tool: "huggingface".into(),
            });
            components.push(PipelineComponent {
                kind: ComponentKind::Transform,
                name: "Feature Extractor".into(),
                tool: "huggingface".into(),
            });
        }
        DataType::Image => {
            components.push(PipelineComponent {
                kind: ComponentKind::Transform,
                name: "Image Augmenter".into(),
                tool: "torchvision".into(),
            });
        }
    }

    let model = profile(family);
    components.push(PipelineComponent {
        kind: ComponentKind::Model,
        name: model.name.into(),
        tool: model.family.to_string(),
    });

    components.push(PipelineComponent {
        kind: ComponentKind::Sink,
        name: "Results Output".into(),
        tool: "pandas".into(),
    });

    components
}

/// Resource estimate for one run of a family, scaled by data size and sample
/// count relative to the profile's reference workload (100 MB, 10k samples).
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyEstimate {
    pub cost_usd: f64,
    pub carbon_kg: f64,
    pub latency_ms: u64,
    pub model_size_mb: u32,
}

pub fn estimate_resources(
    family: ModelFamily,
    data_size_mb: u64,
    num_samples: u64,
) -> FamilyEstimate {
    let p = profile(family);
    let size_factor = (data_size_mb as f64 / 100.0).max(1.0);
    let sample_factor = (num_samples as f64 / 10_000.0).max(1.0);
    FamilyEstimate {
        cost_usd: p.cost_per_run * size_factor,
        carbon_kg: p.carbon_per_run * size_factor,
        latency_ms: (p.latency_ms as f64 * sample_factor) as u64,
        model_size_mb: p.model_size_mb,
    }
}

/// Estimated accuracy for a family under the given constraints-free objective:
/// the profile ceiling when optimizing accuracy, the floor when optimizing
/// cost, the midpoint otherwise.
pub fn estimate_accuracy(family: ModelFamily, objective: warden_types::ObjectiveType) -> f64 {
    let p = profile(family);
    match objective {
        warden_types::ObjectiveType::Accuracy => p.accuracy_ceiling,
        warden_types::ObjectiveType::Cost => p.accuracy_floor,
        _ => (p.accuracy_floor + p.accuracy_ceiling) / 2.0,
    }
}
