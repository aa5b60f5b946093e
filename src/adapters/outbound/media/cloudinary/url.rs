use crate::domain::models::{Fit, TransformationOptions};

/// Cloudinary crop mode for a fit directive
fn crop_mode(fit: Fit) -> &'static str {
    match fit {
        Fit::Cover => "fill",
        Fit::Contain => "fit",
        Fit::Fill => "scale",
        Fit::Inside => "limit",
        Fit::Outside => "mfit",
    }
}

/// `w_300,h_200,c_fill,q_80,f_webp`, or `None` when nothing is requested
pub fn transformation_segment(transformation: &TransformationOptions) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(width) = transformation.width {
        parts.push(format!("w_{}", width));
    }
    if let Some(height) = transformation.height {
        parts.push(format!("h_{}", height));
    }
    if let Some(fit) = transformation.fit {
        parts.push(format!("c_{}", crop_mode(fit)));
    }
    if let Some(quality) = transformation.quality() {
        parts.push(format!("q_{}", quality));
    }
    if let Some(format) = transformation.format {
        parts.push(format!("f_{}", format.as_str()));
    }

    (!parts.is_empty()).then(|| parts.join(","))
}

/// Delivery URL for an uploaded asset
pub fn delivery_url(
    cloud_name: &str,
    resource_type: &str,
    public_id: &str,
    transformation: Option<&TransformationOptions>,
    secure: bool,
) -> String {
    let scheme = if secure { "https" } else { "http" };
    let public_id = public_id
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    match transformation.and_then(transformation_segment) {
        Some(segment) => format!(
            "{}://res.cloudinary.com/{}/{}/upload/{}/{}",
            scheme, cloud_name, resource_type, segment, public_id
        ),
        None => format!(
            "{}://res.cloudinary.com/{}/{}/upload/{}",
            scheme, cloud_name, resource_type, public_id
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ImageFormat;

    #[test]
    fn test_cover_maps_to_fill() {
        let t = TransformationOptions::resize(300, 200).with_fit(Fit::Cover);
        assert_eq!(transformation_segment(&t).as_deref(), Some("w_300,h_200,c_fill"));
    }

    #[test]
    fn test_every_fit() {
        let modes: Vec<_> = [Fit::Cover, Fit::Contain, Fit::Fill, Fit::Inside, Fit::Outside]
            .into_iter()
            .map(crop_mode)
            .collect();
        assert_eq!(modes, vec!["fill", "fit", "scale", "limit", "mfit"]);
    }

    #[test]
    fn test_delivery_url() {
        let t = TransformationOptions::default()
            .with_quality(80)
            .with_format(ImageFormat::Auto);
        assert_eq!(
            delivery_url("demo", "image", "users/avatar", Some(&t), true),
            "https://res.cloudinary.com/demo/image/upload/q_80,f_auto/users/avatar"
        );
        assert_eq!(
            delivery_url("demo", "image", "users/avatar", None, true),
            "https://res.cloudinary.com/demo/image/upload/users/avatar"
        );
        assert_eq!(
            delivery_url("demo", "image", "x", Some(&TransformationOptions::default()), false),
            "http://res.cloudinary.com/demo/image/upload/x"
        );
    }
}
