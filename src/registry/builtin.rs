// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Built-in node table

use super::{ModelField, NodeSpec, WidgetField};

/// Frontend node types with no backend implementation
pub(super) const FRONTEND_ONLY: &[&str] = &["Reroute", "Note", "MarkdownNote", "PrimitiveNode"];

pub(super) const BYPASSABLE: &[&str] = &["Reroute", "Reroute (rgthree)"];

pub(super) const DROPPABLE: &[&str] = &[
    "Note",
    "MarkdownNote",
    "PrimitiveNode",
    "Note Plus (mtb)",
    "Bookmark (rgthree)",
    "Label (rgthree)",
    "Fast Groups Muter (rgthree)",
    "Fast Groups Bypasser (rgthree)",
    // Variable get/set markers are not resolved symbolically
    "GetNode",
    "SetNode",
];

fn spec(widgets: Vec<WidgetField>, inputs: &[&str]) -> NodeSpec {
    NodeSpec {
        widgets,
        inputs: inputs.iter().map(|s| s.to_string()).collect(),
        model: None,
    }
}

fn loader(widgets: Vec<WidgetField>, inputs: &[&str], fields: &[&str], category: &str) -> NodeSpec {
    NodeSpec {
        model: Some(ModelField {
            fields: fields.iter().map(|s| s.to_string()).collect(),
            category: category.to_string(),
        }),
        ..spec(widgets, inputs)
    }
}

fn values(names: &[&str]) -> Vec<WidgetField> {
    names.iter().map(|n| WidgetField::value(*n)).collect()
}

fn sampler_widgets() -> Vec<WidgetField> {
    vec![
        WidgetField::value("seed"),
        WidgetField::control("control_after_generate"),
        WidgetField::value("steps"),
        WidgetField::value("cfg"),
        WidgetField::value("sampler_name"),
        WidgetField::value("scheduler"),
        WidgetField::value("denoise"),
    ]
}

fn advanced_sampler_widgets() -> Vec<WidgetField> {
    vec![
        WidgetField::value("add_noise"),
        WidgetField::value("noise_seed"),
        WidgetField::control("control_after_generate"),
        WidgetField::value("steps"),
        WidgetField::value("cfg"),
        WidgetField::value("sampler_name"),
        WidgetField::value("scheduler"),
        WidgetField::value("start_at_step"),
        WidgetField::value("end_at_step"),
        WidgetField::value("return_with_leftover_noise"),
    ]
}

pub(super) fn node_specs() -> Vec<(&'static str, NodeSpec)> {
    const SAMPLER_INPUTS: &[&str] = &["model", "positive", "negative", "latent_image"];

    vec![
        // Loaders
        (
            "CheckpointLoaderSimple",
            loader(values(&["ckpt_name"]), &[], &["ckpt_name"], "checkpoints"),
        ),
        (
            "CheckpointLoader",
            loader(
                values(&["config_name", "ckpt_name"]),
                &[],
                &["ckpt_name"],
                "checkpoints",
            ),
        ),
        (
            "unCLIPCheckpointLoader",
            loader(values(&["ckpt_name"]), &[], &["ckpt_name"], "checkpoints"),
        ),
        (
            "ImageOnlyCheckpointLoader",
            loader(values(&["ckpt_name"]), &[], &["ckpt_name"], "checkpoints"),
        ),
        (
            "VAELoader",
            loader(values(&["vae_name"]), &[], &["vae_name"], "vae"),
        ),
        (
            "LoraLoader",
            loader(
                values(&["lora_name", "strength_model", "strength_clip"]),
                &["model", "clip"],
                &["lora_name"],
                "loras",
            ),
        ),
        (
            "LoraLoaderModelOnly",
            loader(
                values(&["lora_name", "strength_model"]),
                &["model"],
                &["lora_name"],
                "loras",
            ),
        ),
        (
            "ControlNetLoader",
            loader(
                values(&["control_net_name"]),
                &[],
                &["control_net_name"],
                "controlnet",
            ),
        ),
        (
            "DiffControlNetLoader",
            loader(
                values(&["control_net_name"]),
                &["model"],
                &["control_net_name"],
                "controlnet",
            ),
        ),
        (
            "UpscaleModelLoader",
            loader(values(&["model_name"]), &[], &["model_name"], "upscale_models"),
        ),
        (
            "CLIPLoader",
            loader(values(&["clip_name", "type"]), &[], &["clip_name"], "clip"),
        ),
        (
            "DualCLIPLoader",
            loader(
                values(&["clip_name1", "clip_name2", "type"]),
                &[],
                &["clip_name1", "clip_name2"],
                "clip",
            ),
        ),
        (
            "UNETLoader",
            loader(
                values(&["unet_name", "weight_dtype"]),
                &[],
                &["unet_name"],
                "unet",
            ),
        ),
        (
            "CLIPVisionLoader",
            loader(values(&["clip_name"]), &[], &["clip_name"], "clip_vision"),
        ),
        (
            "StyleModelLoader",
            loader(
                values(&["style_model_name"]),
                &[],
                &["style_model_name"],
                "style_models",
            ),
        ),
        (
            "GLIGENLoader",
            loader(values(&["gligen_name"]), &[], &["gligen_name"], "gligen"),
        ),
        (
            "HypernetworkLoader",
            loader(
                values(&["hypernetwork_name", "strength"]),
                &["model"],
                &["hypernetwork_name"],
                "hypernetworks",
            ),
        ),
        // Sampling
        ("KSampler", spec(sampler_widgets(), SAMPLER_INPUTS)),
        ("KSamplerAdvanced", spec(advanced_sampler_widgets(), SAMPLER_INPUTS)),
        // Conditioning
        ("CLIPTextEncode", spec(values(&["text"]), &["clip"])),
        (
            "CLIPSetLastLayer",
            spec(values(&["stop_at_clip_layer"]), &["clip"]),
        ),
        (
            "ConditioningCombine",
            spec(vec![], &["conditioning_1", "conditioning_2"]),
        ),
        (
            "ControlNetApply",
            spec(
                values(&["strength"]),
                &["conditioning", "control_net", "image"],
            ),
        ),
        (
            "ControlNetApplyAdvanced",
            spec(
                values(&["strength", "start_percent", "end_percent"]),
                &["positive", "negative", "control_net", "image", "vae"],
            ),
        ),
        // Latent
        (
            "EmptyLatentImage",
            spec(values(&["width", "height", "batch_size"]), &[]),
        ),
        (
            "LatentUpscale",
            spec(
                values(&["upscale_method", "width", "height", "crop"]),
                &["samples"],
            ),
        ),
        (
            "LatentUpscaleBy",
            spec(values(&["upscale_method", "scale_by"]), &["samples"]),
        ),
        ("VAEDecode", spec(vec![], &["samples", "vae"])),
        ("VAEEncode", spec(vec![], &["pixels", "vae"])),
        (
            "VAEEncodeForInpaint",
            spec(values(&["grow_mask_by"]), &["pixels", "vae", "mask"]),
        ),
        // Image
        (
            "LoadImage",
            spec(
                vec![WidgetField::value("image"), WidgetField::control("upload")],
                &[],
            ),
        ),
        (
            "LoadImageMask",
            spec(
                vec![
                    WidgetField::value("image"),
                    WidgetField::value("channel"),
                    WidgetField::control("upload"),
                ],
                &[],
            ),
        ),
        (
            "ImageScale",
            spec(
                values(&["upscale_method", "width", "height", "crop"]),
                &["image"],
            ),
        ),
        (
            "ImageUpscaleWithModel",
            spec(vec![], &["upscale_model", "image"]),
        ),
        ("SaveImage", spec(values(&["filename_prefix"]), &["images"])),
        ("PreviewImage", spec(vec![], &["images"])),
        // Routing
        ("Reroute", spec(vec![], &["input"])),
    ]
}
