//! Fixtures shared by the unit tests: a minimal copy of the form component
//! class hierarchy plus helpers to index extra PHP sources.

use crate::config::FormConfig;
use crate::context::AnalysisContext;
use formscope_index::{ProjectIndex, StaticServices};
use formscope_parser::classes::parse_classes;

pub(crate) const FORM_COMPONENT: &[(&str, &str)] = &[
    (
        "file:///vendor/form/FormTypeInterface.php",
        r#"<?php
namespace Symfony\Component\Form;

interface FormTypeInterface
{
    public function getParent();
}
"#,
    ),
    (
        "file:///vendor/form/FormTypeExtensionInterface.php",
        r#"<?php
namespace Symfony\Component\Form;

interface FormTypeExtensionInterface
{
    public static function getExtendedTypes(): iterable;
}
"#,
    ),
    (
        "file:///vendor/form/AbstractType.php",
        r#"<?php
namespace Symfony\Component\Form;

use Symfony\Component\Form\Extension\Core\Type\FormType;
use Symfony\Component\OptionsResolver\OptionsResolver;

abstract class AbstractType implements FormTypeInterface
{
    public function configureOptions(OptionsResolver $resolver)
    {
    }

    public function buildView(FormView $view, FormInterface $form, array $options)
    {
    }

    public function getBlockPrefix()
    {
        return StringUtil::fqcnToBlockPrefix(static::class);
    }

    public function getParent()
    {
        return FormType::class;
    }
}
"#,
    ),
    (
        "file:///vendor/form/AbstractTypeExtension.php",
        r#"<?php
namespace Symfony\Component\Form;

use Symfony\Component\OptionsResolver\OptionsResolver;

abstract class AbstractTypeExtension implements FormTypeExtensionInterface
{
    public function configureOptions(OptionsResolver $resolver)
    {
    }
}
"#,
    ),
    (
        "file:///vendor/form/BaseType.php",
        r#"<?php
namespace Symfony\Component\Form\Extension\Core\Type;

use Symfony\Component\Form\AbstractType;
use Symfony\Component\Form\FormView;

abstract class BaseType extends AbstractType
{
    public function buildView(FormView $view, FormInterface $form, array $options)
    {
        $view->vars = array_replace($view->vars, [
            'form' => $view,
            'id' => $id,
            'name' => $name,
        ]);
    }

    public function configureOptions(OptionsResolver $resolver)
    {
        $resolver->setDefaults([
            'block_name' => null,
            'disabled' => false,
        ]);
    }
}
"#,
    ),
    (
        "file:///vendor/form/FormType.php",
        r#"<?php
namespace Symfony\Component\Form\Extension\Core\Type;

use Symfony\Component\Form\FormView;
use Symfony\Component\OptionsResolver\OptionsResolver;

class FormType extends BaseType
{
    public function buildView(FormView $view, FormInterface $form, array $options)
    {
        parent::buildView($view, $form, $options);

        $view->vars = array_replace($view->vars, [
            'errors' => $form->getErrors(),
            'value' => $form->getViewData(),
        ]);
    }

    public function finishView(FormView $view, FormInterface $form, array $options)
    {
        $view->vars['multipart'] = $multipart;
    }

    public function configureOptions(OptionsResolver $resolver)
    {
        parent::configureOptions($resolver);

        $resolver->setDefaults([
            'compound' => true,
            'required' => true,
            'label' => null,
        ]);
        $resolver->setDefined(['action', 'method']);
    }

    public function getBlockPrefix()
    {
        return 'form';
    }

    public function getParent()
    {
        return null;
    }
}
"#,
    ),
    (
        "file:///vendor/form/TextType.php",
        r#"<?php
namespace Symfony\Component\Form\Extension\Core\Type;

use Symfony\Component\Form\AbstractType;
use Symfony\Component\OptionsResolver\OptionsResolver;

class TextType extends AbstractType
{
    public function configureOptions(OptionsResolver $resolver)
    {
        $resolver->setDefaults([
            'compound' => false,
        ]);
    }

    public function getBlockPrefix()
    {
        return 'text';
    }
}
"#,
    ),
];

pub(crate) const FORM_TYPE: &str = "Symfony\\Component\\Form\\Extension\\Core\\Type\\FormType";
pub(crate) const TEXT_TYPE: &str = "Symfony\\Component\\Form\\Extension\\Core\\Type\\TextType";

/// The form component plus `files`.
pub(crate) fn index_with(files: &[(&str, &str)]) -> ProjectIndex {
    let index = ProjectIndex::new();
    for (uri, source) in FORM_COMPONENT.iter().chain(files) {
        index.update_file(uri, parse_classes(source, uri));
    }
    index
}

/// Index, registry and config owned together so tests can borrow a context.
pub(crate) struct Fixture {
    pub index: ProjectIndex,
    pub services: StaticServices,
    pub config: FormConfig,
}

impl Fixture {
    pub fn new(files: &[(&str, &str)]) -> Self {
        Fixture {
            index: index_with(files),
            services: StaticServices::new(),
            config: FormConfig::default(),
        }
    }

    pub fn with_services(mut self, services: StaticServices) -> Self {
        self.services = services;
        self
    }

    pub fn ctx(&self) -> AnalysisContext<'_> {
        AnalysisContext::new(&self.index, &self.services, &self.config)
    }
}
